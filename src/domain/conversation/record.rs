//! The conversation record aggregate.
//!
//! A `ConversationRecord` is owned by the caller between turns. A turn borrows
//! it mutably, appends messages, writes field values, and may finalize its
//! status exactly once.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::message::{Message, MessageRole};
use super::status::ConversationStatus;
use crate::domain::foundation::{SessionId, StateMachine, Timestamp, ValidationError};

/// A collected field value with its validation status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub field_name: String,
    pub value: Option<String>,
    pub is_valid: bool,
    pub attempts: u32,
    pub last_attempt_at: Option<Timestamp>,
}

impl FieldValue {
    fn empty(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            value: None,
            is_valid: false,
            attempts: 0,
            last_attempt_at: None,
        }
    }
}

/// Escalation bookkeeping, populated when a policy hands the session off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EscalationInfo {
    pub triggered: bool,
    pub reason: Option<String>,
    pub policy_id: Option<String>,
}

/// Complete state of one intake conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub session_id: SessionId,
    pub status: ConversationStatus,
    #[serde(default)]
    pub config_id: Option<String>,
    pub messages: Vec<Message>,
    pub fields: HashMap<String, FieldValue>,
    #[serde(default)]
    pub escalation: EscalationInfo,
    pub started_at: Timestamp,
    pub updated_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Default for ConversationRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationRecord {
    /// Creates an empty, active conversation.
    pub fn new() -> Self {
        let now = Timestamp::now();
        Self {
            session_id: SessionId::new(),
            status: ConversationStatus::Active,
            config_id: None,
            messages: Vec::new(),
            fields: HashMap::new(),
            escalation: EscalationInfo::default(),
            started_at: now,
            updated_at: now,
            ended_at: None,
            metadata: HashMap::new(),
        }
    }

    /// Overrides the start time.
    pub fn with_started_at(mut self, started_at: Timestamp) -> Self {
        self.started_at = started_at;
        self
    }

    /// Tags the record with the id of the agent definition driving it.
    pub fn with_config_id(mut self, config_id: impl Into<String>) -> Self {
        self.config_id = Some(config_id.into());
        self
    }

    /// Appends a message and returns it.
    pub fn add_message(&mut self, role: MessageRole, content: impl Into<String>) -> &Message {
        self.messages.push(Message::new(role, content));
        self.touch();
        let last = self.messages.len() - 1;
        &self.messages[last]
    }

    /// Returns the last `n` messages in chronological order.
    pub fn recent_messages(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Records an extraction attempt for a field.
    ///
    /// The entry is created on first use and the attempt counter always
    /// increments, whatever the validity of `value`.
    pub fn record_attempt(
        &mut self,
        field_name: &str,
        value: Option<String>,
        is_valid: bool,
    ) -> &FieldValue {
        let now = Timestamp::now();
        let entry = self
            .fields
            .entry(field_name.to_string())
            .or_insert_with(|| FieldValue::empty(field_name));
        entry.value = value;
        entry.is_valid = is_valid;
        entry.attempts += 1;
        entry.last_attempt_at = Some(now);
        self.updated_at = now;
        entry
    }

    /// Returns the field entry, if any attempt was recorded.
    pub fn field(&self, field_name: &str) -> Option<&FieldValue> {
        self.fields.get(field_name)
    }

    /// Returns every valid collected value keyed by field name.
    pub fn collected_data(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter(|(_, f)| f.is_valid)
            .filter_map(|(name, f)| f.value.clone().map(|v| (name.clone(), v)))
            .collect()
    }

    /// Returns true if the field holds a valid value.
    pub fn is_collected(&self, field_name: &str) -> bool {
        self.fields
            .get(field_name)
            .is_some_and(|f| f.is_valid && f.value.is_some())
    }

    /// Returns the required names that are missing or invalid, in input order.
    pub fn missing_fields<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|name| !self.is_collected(name))
            .map(String::as_str)
            .collect()
    }

    /// Finalizes the conversation as handed off to a human.
    pub fn mark_escalated(
        &mut self,
        reason: impl Into<String>,
        policy_id: Option<String>,
    ) -> Result<(), ValidationError> {
        self.finish(ConversationStatus::Escalated)?;
        self.escalation = EscalationInfo {
            triggered: true,
            reason: Some(reason.into()),
            policy_id,
        };
        Ok(())
    }

    /// Finalizes the conversation as successfully completed.
    pub fn mark_completed(&mut self) -> Result<(), ValidationError> {
        self.finish(ConversationStatus::Completed)
    }

    /// Finalizes the conversation as failed.
    pub fn mark_failed(&mut self, reason: Option<String>) -> Result<(), ValidationError> {
        self.finish(ConversationStatus::Failed)?;
        if let Some(reason) = reason {
            self.metadata
                .insert("failure_reason".to_string(), serde_json::Value::String(reason));
        }
        Ok(())
    }

    /// Returns true once the conversation left `Active`.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Elapsed seconds from start to end, or to `now` while still open.
    pub fn duration_secs(&self, now: Timestamp) -> f64 {
        let end = self.ended_at.unwrap_or(now);
        end.duration_since(&self.started_at).num_milliseconds() as f64 / 1000.0
    }

    fn finish(&mut self, target: ConversationStatus) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(target)?;
        let now = Timestamp::now();
        self.ended_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod fields {
        use super::*;

        #[test]
        fn first_attempt_creates_entry() {
            let mut record = ConversationRecord::new();
            let value = record.record_attempt("email", Some("a@b.com".into()), true);
            assert_eq!(value.attempts, 1);
            assert!(value.is_valid);
            assert!(value.last_attempt_at.is_some());
        }

        #[test]
        fn attempts_increment_regardless_of_validity() {
            let mut record = ConversationRecord::new();
            record.record_attempt("email", Some("nope".into()), false);
            record.record_attempt("email", Some("a@b.com".into()), true);
            let value = record.record_attempt("email", None, false);
            assert_eq!(value.attempts, 3);
            assert!(!value.is_valid);
        }

        #[test]
        fn collected_data_only_contains_valid_values() {
            let mut record = ConversationRecord::new();
            record.record_attempt("name", Some("Jane".into()), true);
            record.record_attempt("email", Some("bad".into()), false);

            let data = record.collected_data();
            assert_eq!(data.len(), 1);
            assert_eq!(data.get("name"), Some(&"Jane".to_string()));
        }

        #[test]
        fn missing_fields_preserves_requested_order() {
            let mut record = ConversationRecord::new();
            record.record_attempt("email", Some("a@b.com".into()), true);
            let required = vec!["name".to_string(), "email".to_string(), "phone".to_string()];
            assert_eq!(record.missing_fields(&required), vec!["name", "phone"]);
        }
    }

    mod messages {
        use super::*;

        #[test]
        fn add_message_appends_and_updates_timestamp() {
            let mut record = ConversationRecord::new();
            let before = record.updated_at;
            record.add_message(MessageRole::User, "hello");
            assert_eq!(record.messages.len(), 1);
            assert!(record.updated_at >= before);
        }

        #[test]
        fn recent_messages_returns_tail() {
            let mut record = ConversationRecord::new();
            for i in 0..8 {
                record.add_message(MessageRole::User, format!("m{}", i));
            }
            let recent = record.recent_messages(5);
            assert_eq!(recent.len(), 5);
            assert_eq!(recent[0].content, "m3");
            assert_eq!(recent[4].content, "m7");
            assert_eq!(record.recent_messages(50).len(), 8);
        }
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn mark_escalated_records_reason_and_policy() {
            let mut record = ConversationRecord::new();
            record
                .mark_escalated("wants human", Some("policy_0_keyword".into()))
                .unwrap();

            assert_eq!(record.status, ConversationStatus::Escalated);
            assert!(record.escalation.triggered);
            assert_eq!(record.escalation.reason.as_deref(), Some("wants human"));
            assert_eq!(record.escalation.policy_id.as_deref(), Some("policy_0_keyword"));
            assert!(record.ended_at.is_some());
        }

        #[test]
        fn terminal_record_cannot_be_finalized_again() {
            let mut record = ConversationRecord::new();
            record.mark_completed().unwrap();
            assert!(record.is_terminal());
            assert!(record.mark_escalated("late", None).is_err());
            assert!(record.mark_failed(None).is_err());
            assert_eq!(record.status, ConversationStatus::Completed);
        }

        #[test]
        fn mark_failed_stores_reason() {
            let mut record = ConversationRecord::new();
            record.mark_failed(Some("boom".into())).unwrap();
            assert_eq!(
                record.metadata.get("failure_reason"),
                Some(&serde_json::json!("boom"))
            );
        }

        #[test]
        fn duration_uses_now_while_open() {
            let now = Timestamp::now();
            let record = ConversationRecord::new().with_started_at(now.minus_secs(120));
            assert!((record.duration_secs(now) - 120.0).abs() < 0.01);
        }

        #[test]
        fn duration_uses_end_once_closed() {
            let start = Timestamp::now().minus_secs(30);
            let mut record = ConversationRecord::new().with_started_at(start);
            record.mark_completed().unwrap();
            let much_later = Timestamp::now().plus_secs(3600);
            assert!(record.duration_secs(much_later) < 60.0);
        }

        #[test]
        fn record_survives_json_round_trip() {
            let mut record = ConversationRecord::new().with_config_id("intake");
            record.add_message(MessageRole::Agent, "Hello!");
            record.record_attempt("name", Some("Jane".into()), true);
            let json = serde_json::to_string(&record).unwrap();
            let back: ConversationRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(record, back);
        }
    }
}
