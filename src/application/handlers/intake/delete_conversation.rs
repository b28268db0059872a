//! DeleteConversationHandler - Command handler for removing a conversation.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::session_locks::SessionLocks;
use crate::domain::foundation::SessionId;
use crate::ports::{ConversationStore, StoreError};
use crate::telemetry::metrics;

/// Command to delete one conversation.
#[derive(Debug, Clone)]
pub struct DeleteConversationCommand {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeleteConversationError {
    #[error("conversation not found: {0}")]
    NotFound(SessionId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Handler for deleting conversations.
///
/// Waits for any in-flight turn on the session before deleting.
pub struct DeleteConversationHandler {
    store: Arc<dyn ConversationStore>,
    locks: SessionLocks,
}

impl DeleteConversationHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self {
            store,
            locks: SessionLocks::new(),
        }
    }

    pub fn with_locks(mut self, locks: SessionLocks) -> Self {
        self.locks = locks;
        self
    }

    pub async fn handle(&self, cmd: DeleteConversationCommand) -> Result<(), DeleteConversationError> {
        let guard = self.locks.acquire(cmd.session_id).await;

        let was_active = self
            .store
            .get(&cmd.session_id)
            .await?
            .map(|record| record.status.accepts_turns());

        if !self.store.delete(&cmd.session_id).await? {
            return Err(DeleteConversationError::NotFound(cmd.session_id));
        }
        if was_active == Some(true) {
            if let Some(m) = metrics() {
                m.conversation_discarded();
            }
        }

        drop(guard);
        self.locks.release(&cmd.session_id).await;
        info!(session_id = %cmd.session_id, "conversation deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryConversationStore;
    use crate::domain::conversation::ConversationRecord;

    #[tokio::test]
    async fn removes_existing_conversation() {
        let store = Arc::new(InMemoryConversationStore::new());
        let record = ConversationRecord::new();
        store.create(&record).await.unwrap();

        DeleteConversationHandler::new(store.clone())
            .handle(DeleteConversationCommand {
                session_id: record.session_id,
            })
            .await
            .unwrap();

        assert!(store.get(&record.session_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let handler = DeleteConversationHandler::new(Arc::new(InMemoryConversationStore::new()));
        let id = SessionId::new();
        assert_eq!(
            handler.handle(DeleteConversationCommand { session_id: id }).await,
            Err(DeleteConversationError::NotFound(id))
        );
    }

    #[tokio::test]
    async fn second_delete_is_not_found() {
        let store = Arc::new(InMemoryConversationStore::new());
        let record = ConversationRecord::new();
        store.create(&record).await.unwrap();
        let handler = DeleteConversationHandler::new(store);
        let cmd = DeleteConversationCommand {
            session_id: record.session_id,
        };

        handler.handle(cmd.clone()).await.unwrap();

        assert_eq!(
            handler.handle(cmd).await,
            Err(DeleteConversationError::NotFound(record.session_id))
        );
    }

    #[tokio::test]
    async fn forgets_the_session_lock() {
        let locks = SessionLocks::new();
        let store = Arc::new(InMemoryConversationStore::new());
        let record = ConversationRecord::new();
        store.create(&record).await.unwrap();

        DeleteConversationHandler::new(store)
            .with_locks(locks.clone())
            .handle(DeleteConversationCommand {
                session_id: record.session_id,
            })
            .await
            .unwrap();

        assert_eq!(locks.len().await, 0);
    }
}
