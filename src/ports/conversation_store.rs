//! Conversation store port.
//!
//! Persists `ConversationRecord`s between turns, keyed by session id.
//! The turn machine never touches the store; application handlers load a
//! record, run one turn against it, and write it back.
//!
//! Implementations are not required to serialize turns for one session;
//! `ProcessTurnHandler` does that through `SessionLocks`.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::conversation::{ConversationRecord, ConversationStatus};
use crate::domain::foundation::SessionId;

/// Store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("conversation already exists: {0}")]
    AlreadyExists(SessionId),

    #[error("conversation not found: {0}")]
    NotFound(SessionId),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Filter for listing conversations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub status: Option<ConversationStatus>,
    pub limit: Option<usize>,
}

impl ListFilter {
    pub fn with_status(mut self, status: ConversationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Persistence port for conversation records.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Save a new record.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the session id is taken
    async fn create(&self, record: &ConversationRecord) -> Result<(), StoreError>;

    /// Load a record by session id. Returns `None` if absent.
    async fn get(&self, session_id: &SessionId) -> Result<Option<ConversationRecord>, StoreError>;

    /// Replace an existing record, refreshing its `updated_at`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the session id is unknown
    async fn update(&self, record: &ConversationRecord) -> Result<(), StoreError>;

    /// Remove a record. Returns whether one was removed.
    async fn delete(&self, session_id: &SessionId) -> Result<bool, StoreError>;

    /// Records matching the filter, most recently updated first.
    async fn list(&self, filter: ListFilter) -> Result<Vec<ConversationRecord>, StoreError>;

    /// Number of records, optionally restricted to one status.
    async fn count(&self, status: Option<ConversationStatus>) -> Result<usize, StoreError>;

    /// Session ids of every active conversation.
    async fn active_session_ids(&self) -> Result<Vec<SessionId>, StoreError>;

    /// Removes terminal records last updated more than `max_age` ago.
    /// Returns how many were removed.
    async fn cleanup_older_than(&self, max_age: Duration) -> Result<usize, StoreError>;

    /// Removes every record.
    async fn clear(&self) -> Result<(), StoreError>;
}
