//! Timeout policy - fires once the conversation has run too long.

use serde_json::{json, Map};

use super::Trigger;
use crate::domain::conversation::ConversationRecord;
use crate::domain::escalation::policy::TimeoutConfig;
use crate::domain::foundation::Timestamp;

#[derive(Debug, Clone, PartialEq)]
pub struct TimeoutHandler {
    config: TimeoutConfig,
}

impl TimeoutHandler {
    pub fn new(config: TimeoutConfig) -> Self {
        Self { config }
    }

    /// Fires when elapsed time strictly exceeds the limit.
    pub fn check(&self, record: &ConversationRecord, now: Timestamp) -> Option<Trigger> {
        let elapsed = record.duration_secs(now);
        if elapsed <= self.config.max_duration_seconds {
            return None;
        }
        let mut metadata = Map::new();
        metadata.insert("current_duration_seconds".into(), json!(elapsed));
        metadata.insert(
            "max_duration_seconds".into(),
            json!(self.config.max_duration_seconds),
        );
        Some(Trigger::certain(metadata))
    }
}
