//! Completion policy - fires on the collection status of required fields.

use serde_json::{json, Map};

use super::Trigger;
use crate::domain::conversation::ConversationRecord;
use crate::domain::escalation::policy::CompletionConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionHandler {
    config: CompletionConfig,
}

impl CompletionHandler {
    pub fn new(config: CompletionConfig) -> Self {
        Self { config }
    }

    pub fn required_fields(&self) -> &[String] {
        &self.config.required_fields
    }

    /// With `escalate_when_complete` the policy fires once every required
    /// field is collected; without it, while any is missing.
    pub fn check(&self, record: &ConversationRecord) -> Option<Trigger> {
        if self.config.required_fields.is_empty() {
            return None;
        }

        let missing = record.missing_fields(&self.config.required_fields);
        let all_collected = missing.is_empty();
        if all_collected != self.config.escalate_when_complete {
            return None;
        }

        let collected: Vec<String> = record.collected_data().into_keys().collect();
        let mut metadata = Map::new();
        metadata.insert("collected_fields".into(), json!(collected));
        metadata.insert("required_fields".into(), json!(self.config.required_fields));
        if !all_collected {
            metadata.insert("missing_fields".into(), json!(missing));
        }
        Some(Trigger::certain(metadata))
    }
}
