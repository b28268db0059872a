//! StartConversationHandler - Command handler for opening a conversation.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::conversation::{ConversationRecord, ConversationStatus};
use crate::domain::foundation::SessionId;
use crate::domain::turn::AgentContext;
use crate::ports::{ConversationStore, StoreError};
use crate::telemetry::metrics;

/// Command to start a conversation.
#[derive(Debug, Clone, Default)]
pub struct StartConversationCommand {
    /// Caller-supplied tags stored on the record.
    pub metadata: HashMap<String, Value>,
}

/// Result of a started conversation.
#[derive(Debug, Clone)]
pub struct StartConversationResult {
    pub session_id: SessionId,
    pub greeting: String,
    pub status: ConversationStatus,
    pub record: ConversationRecord,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StartConversationError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Handler for starting conversations.
pub struct StartConversationHandler {
    context: AgentContext,
    store: Arc<dyn ConversationStore>,
}

impl StartConversationHandler {
    pub fn new(context: AgentContext, store: Arc<dyn ConversationStore>) -> Self {
        Self { context, store }
    }

    pub async fn handle(
        &self,
        cmd: StartConversationCommand,
    ) -> Result<StartConversationResult, StartConversationError> {
        let mut record = self.context.start_conversation();
        record.metadata.extend(cmd.metadata);

        self.store.create(&record).await?;
        if let Some(m) = metrics() {
            m.conversation_started();
        }

        Ok(StartConversationResult {
            session_id: record.session_id,
            greeting: self.context.definition().greeting.clone(),
            status: record.status,
            record,
        })
    }
}
