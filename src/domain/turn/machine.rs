//! The turn machine.
//!
//! One call to [`TurnMachine::run`] walks the fixed step graph from
//! `CheckEscalation` to a terminal step, producing exactly one reply. The
//! machine keeps nothing between turns; all carry-over lives in the record.

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::detectors::{detect_correction, detect_off_topic};
use super::prompts::{
    completion_prompt, field_prompt, field_prompt_fallback, format_help_fallback,
    format_help_prompt, redirect_fallback, redirect_prompt, COMPLETION_FALLBACK,
    DEFAULT_ESCALATION_REASON, ESCALATION_REPLY, NOTHING_LEFT_REPLY,
};
use super::state::{
    after_correction_check, after_escalation_check, after_off_topic_check, after_validation,
    TurnState, TurnStep,
};
use crate::domain::agent::AgentDefinition;
use crate::domain::capability::ask;
use crate::domain::conversation::{ConversationRecord, ConversationStatus, MessageRole};
use crate::domain::escalation::{EscalationEngine, EscalationOutcome, PolicyContext};
use crate::domain::fields::{
    build_extraction_prompt, parse_extraction_reply, validate_value, FieldType,
};
use crate::domain::foundation::Timestamp;
use crate::ports::{AIProvider, CompletionPurpose};

/// The longest path through the graph is six steps.
const MAX_STEPS: usize = 8;

/// Errors surfaced by a turn. Capability failures never appear here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TurnError {
    #[error("utterance cannot be empty")]
    EmptyUtterance,

    #[error("conversation is {0} and accepts no further turns")]
    ConversationClosed(ConversationStatus),

    #[error("turn processing failed: {0}")]
    Processing(String),
}

impl TurnError {
    pub fn processing(message: impl Into<String>) -> Self {
        Self::Processing(message.into())
    }
}

/// What a finished turn reports back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub status: ConversationStatus,
    pub final_step: TurnStep,
    pub path: Vec<TurnStep>,
    pub escalation: Option<EscalationOutcome>,
    /// Field that received a valid value this turn.
    pub field_updated: Option<String>,
    /// Set when an extracted value was validated, whatever the result.
    pub validation: Option<ValidationCheck>,
    pub metadata: Map<String, Value>,
}

/// One validation performed during a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationCheck {
    pub field_type: FieldType,
    pub valid: bool,
}

/// Borrowed view of everything one turn needs.
pub struct TurnMachine<'a> {
    definition: &'a AgentDefinition,
    escalation: &'a EscalationEngine,
    ai: &'a dyn AIProvider,
}

impl<'a> TurnMachine<'a> {
    pub fn new(
        definition: &'a AgentDefinition,
        escalation: &'a EscalationEngine,
        ai: &'a dyn AIProvider,
    ) -> Self {
        Self {
            definition,
            escalation,
            ai,
        }
    }

    /// Runs one turn against `record`.
    ///
    /// Appends the user message, walks the graph, then appends the reply.
    ///
    /// # Errors
    ///
    /// - `EmptyUtterance` if the utterance is blank
    /// - `ConversationClosed` if the record is already terminal
    /// - `Processing` on an internal failure mid-turn
    pub async fn run(
        &self,
        record: &mut ConversationRecord,
        utterance: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(TurnError::EmptyUtterance);
        }
        if !record.status.accepts_turns() {
            return Err(TurnError::ConversationClosed(record.status));
        }

        record.add_message(MessageRole::User, utterance);
        let session_id = record.session_id;
        let mut state = TurnState::new(record, utterance);

        let mut step = TurnStep::CheckEscalation;
        loop {
            if state.path.len() >= MAX_STEPS {
                return Err(TurnError::processing(format!(
                    "turn exceeded {} steps: {:?}",
                    MAX_STEPS, state.path
                )));
            }
            state.path.push(step);
            debug!(session_id = %session_id, step = %step, "turn step");

            let next = match step {
                TurnStep::CheckEscalation => self.check_escalation(&mut state).await,
                TurnStep::CheckCorrection => self.check_correction(&mut state).await,
                TurnStep::CheckOffTopic => self.check_off_topic(&mut state).await,
                TurnStep::ExtractField => self.extract_field(&mut state).await,
                TurnStep::Validate => self.validate(&mut state),
                TurnStep::Escalate => {
                    self.escalate(&mut state)?;
                    break;
                }
                TurnStep::PromptNext => {
                    self.prompt_next(&mut state).await;
                    break;
                }
                TurnStep::Complete => {
                    self.complete(&mut state).await?;
                    break;
                }
            };
            step = next;
        }

        let reply = state
            .reply
            .take()
            .ok_or_else(|| TurnError::processing(format!("{} produced no reply", step)))?;
        let field_updated = if state.is_valid {
            state.current_field.clone()
        } else {
            None
        };

        let validation = state.checked_type.map(|field_type| ValidationCheck {
            field_type,
            valid: state.is_valid,
        });

        let TurnState {
            record,
            escalation,
            metadata,
            path,
            ..
        } = state;
        record.add_message(MessageRole::Agent, reply.as_str());

        Ok(TurnOutcome {
            reply,
            status: record.status,
            final_step: step,
            path,
            escalation,
            field_updated,
            validation,
            metadata,
        })
    }

    async fn check_escalation(&self, state: &mut TurnState<'_>) -> TurnStep {
        if !self.escalation.has_policies() {
            return TurnStep::CheckCorrection;
        }
        let ctx = PolicyContext {
            record: &*state.record,
            utterance: &state.utterance,
            now: Timestamp::now(),
        };
        let outcome = self.escalation.evaluate(&ctx, self.ai).await;
        state.escalation = outcome;
        after_escalation_check(state)
    }

    async fn check_correction(&self, state: &mut TurnState<'_>) -> TurnStep {
        let decision = detect_correction(&state.utterance, &*state.record, self.ai).await;
        state.is_correction = decision.is_correction;
        state.correction_field = decision.target;
        if state.is_correction {
            state
                .metadata
                .insert("correction_target".into(), json!(state.correction_field));
        }
        after_correction_check(state)
    }

    async fn check_off_topic(&self, state: &mut TurnState<'_>) -> TurnStep {
        let Some(pending) = self.definition.next_field_to_collect(&*state.record) else {
            return after_off_topic_check(false, false);
        };
        let off_topic = detect_off_topic(&state.utterance, pending, &*state.record, self.ai).await;
        state.is_off_topic = off_topic;
        after_off_topic_check(true, off_topic)
    }

    async fn extract_field(&self, state: &mut TurnState<'_>) -> TurnStep {
        // A correction target outside this definition falls back to the next field.
        let target = state
            .correction_field
            .as_deref()
            .and_then(|name| self.definition.field(name))
            .or_else(|| self.definition.next_field_to_collect(&*state.record));

        let Some(field) = target else {
            return TurnStep::Validate;
        };

        state.current_field = Some(field.name.clone());
        state.extraction_attempted = true;

        let prompt = build_extraction_prompt(field, &state.utterance);
        state.extracted_value = match ask(
            self.ai,
            state.record.session_id,
            CompletionPurpose::Extraction,
            prompt,
        )
        .await
        {
            Ok(reply) => parse_extraction_reply(&reply).into_value(),
            Err(e) => {
                warn!(
                    session_id = %state.record.session_id,
                    field = %field.name,
                    error = %e,
                    "extraction failed, treating as no value"
                );
                None
            }
        };
        debug!(
            session_id = %state.record.session_id,
            field = %field.name,
            extracted = state.extracted_value.is_some(),
            "extraction finished"
        );
        TurnStep::Validate
    }

    fn validate(&self, state: &mut TurnState<'_>) -> TurnStep {
        let field = state
            .current_field
            .as_deref()
            .and_then(|name| self.definition.field(name));

        if let (Some(field), Some(value)) = (field, state.extracted_value.as_deref()) {
            state.checked_type = Some(field.field_type);
            match validate_value(field, value) {
                Ok(()) => {
                    state
                        .record
                        .record_attempt(&field.name, Some(value.to_string()), true);
                    state.is_valid = true;
                    debug!(session_id = %state.record.session_id, field = %field.name, "field collected");
                }
                Err(reason) => {
                    debug!(
                        session_id = %state.record.session_id,
                        field = %field.name,
                        reason = %reason,
                        "extracted value rejected"
                    );
                    state
                        .metadata
                        .insert("validation_error".into(), json!(reason.to_string()));
                }
            }
        }

        let pending = self
            .definition
            .next_field_to_collect(&*state.record)
            .is_some();
        after_validation(pending)
    }

    fn escalate(&self, state: &mut TurnState<'_>) -> Result<(), TurnError> {
        let (reason, policy_id) = match &state.escalation {
            Some(outcome) => (outcome.reason().to_string(), Some(outcome.policy_id().to_string())),
            None => (DEFAULT_ESCALATION_REASON.to_string(), None),
        };
        state
            .record
            .mark_escalated(reason.as_str(), policy_id.clone())
            .map_err(|e| TurnError::processing(e.to_string()))?;
        info!(
            session_id = %state.record.session_id,
            policy_id = ?policy_id,
            reason = %reason,
            "conversation escalated"
        );
        state.reply = Some(ESCALATION_REPLY.to_string());
        Ok(())
    }

    async fn prompt_next(&self, state: &mut TurnState<'_>) {
        let Some(field) = self.definition.next_field_to_collect(&*state.record) else {
            state.reply = Some(NOTHING_LEFT_REPLY.to_string());
            return;
        };
        let personality = &self.definition.personality;

        let reply = if state.is_off_topic {
            let prompt = redirect_prompt(personality, field, &state.utterance);
            self.generate(state, CompletionPurpose::Redirect, prompt)
                .await
                .unwrap_or_else(|| redirect_fallback(field))
        } else if state.extraction_failed()
            && state.current_field.as_deref() == Some(field.name.as_str())
        {
            let prompt = format_help_prompt(personality, field, &state.utterance);
            self.generate(state, CompletionPurpose::FormatHelp, prompt)
                .await
                .unwrap_or_else(|| format_help_fallback(field))
        } else {
            let prompt = field_prompt(personality, field, &*state.record);
            self.generate(state, CompletionPurpose::FieldPrompt, prompt)
                .await
                .unwrap_or_else(|| field_prompt_fallback(field))
        };
        state.reply = Some(reply);
    }

    async fn complete(&self, state: &mut TurnState<'_>) -> Result<(), TurnError> {
        let collected = state.record.collected_data();
        let prompt = completion_prompt(&self.definition.personality, &collected);
        let reply = self
            .generate(state, CompletionPurpose::Completion, prompt)
            .await
            .unwrap_or_else(|| COMPLETION_FALLBACK.to_string());

        state
            .record
            .mark_completed()
            .map_err(|e| TurnError::processing(e.to_string()))?;
        info!(
            session_id = %state.record.session_id,
            fields = collected.len(),
            "conversation completed"
        );
        state.reply = Some(reply);
        Ok(())
    }

    /// Asks for a reply; a failure is logged and yields `None`.
    async fn generate(
        &self,
        state: &mut TurnState<'_>,
        purpose: CompletionPurpose,
        prompt: String,
    ) -> Option<String> {
        match ask(self.ai, state.record.session_id, purpose, prompt).await {
            Ok(reply) if !reply.is_empty() => Some(reply),
            Ok(_) => {
                warn!(session_id = %state.record.session_id, purpose = %purpose, "empty reply, using fallback");
                None
            }
            Err(e) => {
                warn!(session_id = %state.record.session_id, purpose = %purpose, error = %e, "reply generation failed, using fallback");
                // only the plain field prompt reports its failure to the caller
                if purpose == CompletionPurpose::FieldPrompt {
                    state.metadata.insert("prompt_error".into(), json!(e.to_string()));
                }
                None
            }
        }
    }
}
