//! HTTP DTOs for conversation endpoints.
//!
//! These types decouple the HTTP API from domain types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::application::handlers::intake::{
    ConversationView, ProcessTurnResult, StartConversationResult,
};
use crate::domain::conversation::{ConversationStatus, Message, MessageRole};
use crate::domain::foundation::Timestamp;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /conversations/:session_id/messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StartConversationResponse {
    pub session_id: String,
    pub greeting: String,
    pub status: ConversationStatus,
}

impl From<StartConversationResult> for StartConversationResponse {
    fn from(result: StartConversationResult) -> Self {
        Self {
            session_id: result.session_id.to_string(),
            greeting: result.greeting,
            status: result.status,
        }
    }
}

/// Reply to one user message.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MessageResponse {
    pub response: String,
    pub session_id: String,
    pub status: ConversationStatus,
    pub collected_data: BTreeMap<String, String>,
}

impl From<ProcessTurnResult> for MessageResponse {
    fn from(result: ProcessTurnResult) -> Self {
        Self {
            response: result.reply,
            session_id: result.session_id.to_string(),
            status: result.status,
            collected_data: result.collected_data,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MessageView {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: Timestamp,
}

impl From<Message> for MessageView {
    fn from(message: Message) -> Self {
        Self {
            role: message.role,
            content: message.content,
            timestamp: message.timestamp,
        }
    }
}

/// Full conversation snapshot.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConversationResponse {
    pub session_id: String,
    pub status: ConversationStatus,
    pub messages: Vec<MessageView>,
    pub collected_data: BTreeMap<String, String>,
    pub started_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ConversationView> for ConversationResponse {
    fn from(view: ConversationView) -> Self {
        Self {
            session_id: view.session_id.to_string(),
            status: view.status,
            messages: view.messages.into_iter().map(MessageView::from).collect(),
            collected_data: view.collected_data,
            started_at: view.started_at,
            updated_at: view.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeleteConversationResponse {
    pub message: String,
}
