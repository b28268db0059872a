//! WebSocket message types for the conversation channel.
//!
//! Every frame is a JSON text message tagged by `type`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::conversation::ConversationStatus;

/// Messages sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A user utterance.
    Message {
        #[serde(default)]
        content: String,
    },
    Ping,
}

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First frame on every connection.
    Connected {
        session_id: String,
        greeting: String,
        status: ConversationStatus,
    },
    /// The agent's reply to one user message.
    Response {
        content: String,
        status: ConversationStatus,
        collected_data: BTreeMap<String, String>,
    },
    /// Follows the response that completed the conversation.
    Completed {
        collected_data: BTreeMap<String, String>,
    },
    Error {
        message: String,
    },
    Pong,
}
