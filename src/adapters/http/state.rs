//! Shared state for the HTTP and WebSocket handlers.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::handlers::intake::{
    DeleteConversationHandler, GetConversationHandler, ProcessTurnHandler, SessionLocks,
    StartConversationHandler,
};
use crate::domain::turn::AgentContext;
use crate::ports::{AIProvider, ConversationStore};

use super::error::ApiError;

/// Application state for every route.
///
/// The agent can be replaced at runtime through `PUT /config`; handlers
/// take a snapshot of it per request.
#[derive(Clone)]
pub struct IntakeAppState {
    agent: Arc<RwLock<Option<AgentContext>>>,
    pub store: Arc<dyn ConversationStore>,
    pub ai: Arc<dyn AIProvider>,
    pub locks: SessionLocks,
    pub configs_dir: PathBuf,
}

impl IntakeAppState {
    /// Creates state with no agent loaded.
    pub fn new(
        store: Arc<dyn ConversationStore>,
        ai: Arc<dyn AIProvider>,
        configs_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            agent: Arc::new(RwLock::new(None)),
            store,
            ai,
            locks: SessionLocks::new(),
            configs_dir: configs_dir.into(),
        }
    }

    pub fn with_agent(self, context: AgentContext) -> Self {
        Self {
            agent: Arc::new(RwLock::new(Some(context))),
            ..self
        }
    }

    /// The currently loaded agent, if any.
    pub async fn agent(&self) -> Option<AgentContext> {
        self.agent.read().await.clone()
    }

    pub async fn require_agent(&self) -> Result<AgentContext, ApiError> {
        self.agent().await.ok_or(ApiError::AgentNotConfigured)
    }

    /// Swaps in a new agent. Conversations already stored keep their records.
    pub async fn replace_agent(&self, context: AgentContext) {
        *self.agent.write().await = Some(context);
    }

    pub fn start_handler(&self, context: AgentContext) -> StartConversationHandler {
        StartConversationHandler::new(context, self.store.clone())
    }

    pub fn turn_handler(&self, context: AgentContext) -> ProcessTurnHandler {
        ProcessTurnHandler::new(context, self.store.clone()).with_locks(self.locks.clone())
    }

    pub fn get_handler(&self) -> GetConversationHandler {
        GetConversationHandler::new(self.store.clone())
    }

    pub fn delete_handler(&self) -> DeleteConversationHandler {
        DeleteConversationHandler::new(self.store.clone()).with_locks(self.locks.clone())
    }
}
