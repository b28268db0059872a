//! GetConversationHandler - Query handler for a conversation snapshot.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::conversation::{ConversationStatus, EscalationInfo, Message};
use crate::domain::foundation::{SessionId, Timestamp};
use crate::ports::{ConversationStore, StoreError};

/// Query for one conversation.
#[derive(Debug, Clone)]
pub struct GetConversationQuery {
    pub session_id: SessionId,
}

/// Read model of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationView {
    pub session_id: SessionId,
    pub status: ConversationStatus,
    pub messages: Vec<Message>,
    pub collected_data: BTreeMap<String, String>,
    pub escalation: EscalationInfo,
    pub started_at: Timestamp,
    pub updated_at: Timestamp,
    pub ended_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GetConversationError {
    #[error("conversation not found: {0}")]
    NotFound(SessionId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Handler for conversation queries.
pub struct GetConversationHandler {
    store: Arc<dyn ConversationStore>,
}

impl GetConversationHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        query: GetConversationQuery,
    ) -> Result<ConversationView, GetConversationError> {
        let record = self
            .store
            .get(&query.session_id)
            .await?
            .ok_or(GetConversationError::NotFound(query.session_id))?;

        Ok(ConversationView {
            session_id: record.session_id,
            status: record.status,
            collected_data: record.collected_data(),
            messages: record.messages,
            escalation: record.escalation,
            started_at: record.started_at,
            updated_at: record.updated_at,
            ended_at: record.ended_at,
        })
    }
}
