//! Per-turn working state and the eight steps of a turn.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::domain::conversation::ConversationRecord;
use crate::domain::escalation::EscalationOutcome;
use crate::domain::fields::FieldType;

/// One step of the turn graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStep {
    CheckEscalation,
    CheckCorrection,
    CheckOffTopic,
    ExtractField,
    Validate,
    Escalate,
    PromptNext,
    Complete,
}

impl TurnStep {
    /// Terminal steps produce the reply and end the turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnStep::Escalate | TurnStep::PromptNext | TurnStep::Complete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TurnStep::CheckEscalation => "check_escalation",
            TurnStep::CheckCorrection => "check_correction",
            TurnStep::CheckOffTopic => "check_off_topic",
            TurnStep::ExtractField => "extract_field",
            TurnStep::Validate => "validate",
            TurnStep::Escalate => "escalate",
            TurnStep::PromptNext => "prompt_next",
            TurnStep::Complete => "complete",
        }
    }
}

impl fmt::Display for TurnStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Working memory of one turn. Created at turn start, dropped at turn end.
#[derive(Debug)]
pub struct TurnState<'r> {
    pub record: &'r mut ConversationRecord,
    pub utterance: String,
    pub escalation: Option<EscalationOutcome>,
    pub is_correction: bool,
    pub correction_field: Option<String>,
    pub is_off_topic: bool,
    /// Field targeted by extraction this turn.
    pub current_field: Option<String>,
    pub extraction_attempted: bool,
    pub extracted_value: Option<String>,
    pub is_valid: bool,
    /// Type of the field whose extracted value was checked this turn.
    pub checked_type: Option<FieldType>,
    pub reply: Option<String>,
    pub metadata: Map<String, Value>,
    /// Steps visited, in order.
    pub path: Vec<TurnStep>,
}

impl<'r> TurnState<'r> {
    pub fn new(record: &'r mut ConversationRecord, utterance: impl Into<String>) -> Self {
        Self {
            record,
            utterance: utterance.into(),
            escalation: None,
            is_correction: false,
            correction_field: None,
            is_off_topic: false,
            current_field: None,
            extraction_attempted: false,
            extracted_value: None,
            is_valid: false,
            checked_type: None,
            reply: None,
            metadata: Map::new(),
            path: Vec::new(),
        }
    }

    /// True when this turn tried a field and did not get a valid value.
    pub fn extraction_failed(&self) -> bool {
        self.extraction_attempted && !self.is_valid
    }
}

// Routing predicates. Each maps the facts gathered so far to the next step.

pub fn after_escalation_check(state: &TurnState<'_>) -> TurnStep {
    if state.escalation.is_some() {
        TurnStep::Escalate
    } else {
        TurnStep::CheckCorrection
    }
}

pub fn after_correction_check(state: &TurnState<'_>) -> TurnStep {
    if state.is_correction {
        TurnStep::ExtractField
    } else {
        TurnStep::CheckOffTopic
    }
}

/// With nothing left to collect the turn completes whatever the utterance was.
pub fn after_off_topic_check(field_pending: bool, is_off_topic: bool) -> TurnStep {
    match (field_pending, is_off_topic) {
        (false, _) => TurnStep::Complete,
        (true, true) => TurnStep::PromptNext,
        (true, false) => TurnStep::ExtractField,
    }
}

pub fn after_validation(field_pending: bool) -> TurnStep {
    if field_pending {
        TurnStep::PromptNext
    } else {
        TurnStep::Complete
    }
}
