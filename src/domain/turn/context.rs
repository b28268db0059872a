//! Agent context - everything built once per configuration load.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::machine::{TurnError, TurnMachine, TurnOutcome};
use crate::domain::agent::{AgentDefinition, AgentDefinitionError};
use crate::domain::conversation::{ConversationRecord, MessageRole};
use crate::domain::escalation::EscalationEngine;
use crate::ports::AIProvider;

/// Runs one turn against a loaded record.
///
/// `AgentContext` is the production runner. Handlers depend on this trait
/// so a turn can be substituted in tests.
#[async_trait]
pub trait TurnRunner: Send + Sync {
    async fn run_turn(
        &self,
        record: &mut ConversationRecord,
        utterance: &str,
    ) -> Result<TurnOutcome, TurnError>;
}

/// A validated agent definition, its compiled escalation engine and the
/// text capability. Cheap to clone and shared by every turn.
#[derive(Clone)]
pub struct AgentContext {
    definition: Arc<AgentDefinition>,
    escalation: Arc<EscalationEngine>,
    ai: Arc<dyn AIProvider>,
}

impl AgentContext {
    /// Validates the definition and compiles its policies.
    ///
    /// # Errors
    ///
    /// Any `AgentDefinitionError`; nothing is checked again at turn time.
    pub fn new(
        definition: AgentDefinition,
        ai: Arc<dyn AIProvider>,
    ) -> Result<Self, AgentDefinitionError> {
        definition.validate()?;
        let escalation = definition.escalation_engine()?;
        info!(
            config_id = ?definition.id,
            fields = definition.fields.len(),
            policies = escalation.policies().len(),
            "agent context ready"
        );
        Ok(Self {
            definition: Arc::new(definition),
            escalation: Arc::new(escalation),
            ai,
        })
    }

    pub fn definition(&self) -> &AgentDefinition {
        &self.definition
    }

    pub fn escalation(&self) -> &EscalationEngine {
        &self.escalation
    }

    pub fn ai(&self) -> &dyn AIProvider {
        self.ai.as_ref()
    }

    /// Creates an active record opened with the greeting.
    pub fn start_conversation(&self) -> ConversationRecord {
        let mut record = ConversationRecord::new();
        if let Some(id) = &self.definition.id {
            record = record.with_config_id(id.as_str());
        }
        record.add_message(MessageRole::Agent, self.definition.greeting.as_str());
        info!(session_id = %record.session_id, "conversation started");
        record
    }

    /// Runs one turn. The caller serializes turns per session.
    pub async fn run_turn(
        &self,
        record: &mut ConversationRecord,
        utterance: &str,
    ) -> Result<TurnOutcome, TurnError> {
        TurnMachine::new(&self.definition, &self.escalation, self.ai.as_ref())
            .run(record, utterance)
            .await
    }
}

#[async_trait]
impl TurnRunner for AgentContext {
    async fn run_turn(
        &self,
        record: &mut ConversationRecord,
        utterance: &str,
    ) -> Result<TurnOutcome, TurnError> {
        AgentContext::run_turn(self, record, utterance).await
    }
}

impl std::fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentContext")
            .field("definition", &self.definition)
            .field("escalation", &self.escalation)
            .field("ai", &self.ai.provider_info().name)
            .finish()
    }
}
