//! ProcessTurnHandler - Command handler for one user utterance.
//!
//! Loads the record, runs one turn, and persists the result. A turn that
//! fails mid-way marks the conversation Failed before the error is returned.
//!
//! Turns on one session are serialized: the session's lock is held from
//! load to write-back, so concurrent callers queue instead of overwriting
//! each other.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::error;

use super::session_locks::SessionLocks;
use crate::domain::conversation::{ConversationRecord, ConversationStatus};
use crate::domain::foundation::SessionId;
use crate::domain::turn::{AgentContext, TurnError, TurnOutcome, TurnRunner};
use crate::ports::{ConversationStore, StoreError};
use crate::telemetry::metrics;

/// Command carrying one user utterance.
#[derive(Debug, Clone)]
pub struct ProcessTurnCommand {
    pub session_id: SessionId,
    pub utterance: String,
}

/// Result of a processed turn.
#[derive(Debug, Clone)]
pub struct ProcessTurnResult {
    pub session_id: SessionId,
    pub reply: String,
    pub status: ConversationStatus,
    pub collected_data: BTreeMap<String, String>,
    pub outcome: TurnOutcome,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessTurnError {
    #[error("conversation not found: {0}")]
    NotFound(SessionId),

    #[error(transparent)]
    Turn(#[from] TurnError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Handler for user turns.
pub struct ProcessTurnHandler {
    runner: Arc<dyn TurnRunner>,
    store: Arc<dyn ConversationStore>,
    locks: SessionLocks,
}

impl ProcessTurnHandler {
    pub fn new(context: AgentContext, store: Arc<dyn ConversationStore>) -> Self {
        Self::with_runner(Arc::new(context), store)
    }

    pub fn with_runner(runner: Arc<dyn TurnRunner>, store: Arc<dyn ConversationStore>) -> Self {
        Self {
            runner,
            store,
            locks: SessionLocks::new(),
        }
    }

    /// Shares turn locks with other handlers of the same store.
    pub fn with_locks(mut self, locks: SessionLocks) -> Self {
        self.locks = locks;
        self
    }

    pub async fn handle(&self, cmd: ProcessTurnCommand) -> Result<ProcessTurnResult, ProcessTurnError> {
        let started = Instant::now();
        let result = self.handle_locked(cmd).await;
        if let Some(m) = metrics() {
            m.record_message(result.is_ok(), started.elapsed().as_secs_f64());
        }
        result
    }

    async fn handle_locked(&self, cmd: ProcessTurnCommand) -> Result<ProcessTurnResult, ProcessTurnError> {
        let _guard = self.locks.acquire(cmd.session_id).await;

        let mut record = self
            .store
            .get(&cmd.session_id)
            .await?
            .ok_or(ProcessTurnError::NotFound(cmd.session_id))?;

        if !record.status.accepts_turns() {
            return Err(TurnError::ConversationClosed(record.status).into());
        }

        match self.runner.run_turn(&mut record, &cmd.utterance).await {
            Ok(outcome) => {
                self.store.update(&record).await?;
                self.observe(&record, &outcome).await;
                Ok(ProcessTurnResult {
                    session_id: record.session_id,
                    reply: outcome.reply.clone(),
                    status: record.status,
                    collected_data: record.collected_data(),
                    outcome,
                })
            }
            Err(TurnError::Processing(message)) => {
                error!(session_id = %record.session_id, error = %message, "turn failed, marking conversation failed");
                if record.mark_failed(Some(message.clone())).is_ok() {
                    self.store.update(&record).await?;
                    self.closed(&record).await;
                }
                Err(TurnError::Processing(message).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn observe(&self, record: &ConversationRecord, outcome: &TurnOutcome) {
        if let Some(m) = metrics() {
            if let Some(check) = outcome.validation {
                m.record_validation(check.field_type, check.valid);
            }
            if let Some(escalation) = &outcome.escalation {
                if record.status == ConversationStatus::Escalated {
                    m.record_escalation(escalation);
                }
            }
        }
        if record.is_terminal() {
            self.closed(record).await;
        }
    }

    /// A terminal record takes no more turns; its lock can go.
    async fn closed(&self, record: &ConversationRecord) {
        if let Some(m) = metrics() {
            m.conversation_ended(record.status);
        }
        self.locks.release(&record.session_id).await;
    }
}
