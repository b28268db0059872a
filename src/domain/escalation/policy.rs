//! Escalation policy definitions and their typed configurations.
//!
//! A policy arrives from configuration as a type tag, a reason and a
//! free-form map. The map is parsed into the typed config of its policy
//! type once, at load time, so a malformed policy never reaches a turn.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// The five escalation trigger kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    Keyword,
    Timeout,
    Sentiment,
    LlmIntent,
    Completion,
}

impl PolicyType {
    /// Evaluation rank; lower runs first.
    pub fn priority(&self) -> u8 {
        match self {
            PolicyType::Keyword => 1,
            PolicyType::Timeout => 2,
            PolicyType::Sentiment => 3,
            PolicyType::LlmIntent => 4,
            PolicyType::Completion => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyType::Keyword => "keyword",
            PolicyType::Timeout => "timeout",
            PolicyType::Sentiment => "sentiment",
            PolicyType::LlmIntent => "llm_intent",
            PolicyType::Completion => "completion",
        }
    }

    /// True for handlers that consult the text capability.
    pub fn uses_capability(&self) -> bool {
        matches!(self, PolicyType::Sentiment | PolicyType::LlmIntent)
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_enabled() -> bool {
    true
}

/// One configured escalation policy.
///
/// Settings may sit under `config:` or directly beside `type:`; when a key
/// appears in both places the `config:` entry wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationPolicyDefinition {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub reason: String,
    #[serde(rename = "type", alias = "policy_type")]
    pub policy_type: PolicyType,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(flatten)]
    pub inline: Map<String, Value>,
}

impl EscalationPolicyDefinition {
    pub fn new(policy_type: PolicyType, reason: impl Into<String>) -> Self {
        Self {
            enabled: true,
            reason: reason.into(),
            policy_type,
            config: Map::new(),
            inline: Map::new(),
        }
    }

    /// Adds one configuration entry.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Inline keys merged with the `config` map.
    pub fn settings(&self) -> Map<String, Value> {
        let mut merged = self.inline.clone();
        for (key, value) in &self.config {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

/// A policy whose configuration cannot be used.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyConfigError {
    #[error("policy {index} ({policy_type}): reason cannot be empty")]
    EmptyReason { index: usize, policy_type: PolicyType },

    #[error("policy {index} ({policy_type}): malformed config: {message}")]
    Malformed {
        index: usize,
        policy_type: PolicyType,
        message: String,
    },

    #[error("policy {index} ({policy_type}): {key} must be between 0 and 1, got {value}")]
    ThresholdOutOfRange {
        index: usize,
        policy_type: PolicyType,
        key: &'static str,
        value: f64,
    },

    #[error("policy {index} (completion): unknown field '{field}'")]
    UnknownField { index: usize, field: String },
}

impl PolicyConfigError {
    pub fn malformed(index: usize, policy_type: PolicyType, message: impl Into<String>) -> Self {
        Self::Malformed {
            index,
            policy_type,
            message: message.into(),
        }
    }
}

/// `keyword` settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub keywords: Vec<String>,
    pub case_sensitive: bool,
    pub match_whole_word: bool,
}

/// `timeout` settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeoutConfig {
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub max_duration_seconds: f64,
}

/// `sentiment` settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub threshold: f64,
    pub include_history: bool,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            include_history: false,
        }
    }
}

/// `llm_intent` settings. An empty intent list means the default set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LlmIntentConfig {
    pub intents: Vec<String>,
    pub confidence_threshold: f64,
}

impl Default for LlmIntentConfig {
    fn default() -> Self {
        Self {
            intents: Vec::new(),
            confidence_threshold: 0.8,
        }
    }
}

/// `completion` settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub required_fields: Vec<String>,
    pub escalate_when_complete: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            required_fields: Vec::new(),
            escalate_when_complete: true,
        }
    }
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("'{}' is not a number", s))),
    }
}

/// Parses a definition's settings into a typed config.
pub(crate) fn parse_settings<T>(index: usize, def: &EscalationPolicyDefinition) -> Result<T, PolicyConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(Value::Object(def.settings()))
        .map_err(|e| PolicyConfigError::malformed(index, def.policy_type, e.to_string()))
}

/// Checks a probability-like setting.
pub(crate) fn check_unit_range(
    index: usize,
    policy_type: PolicyType,
    key: &'static str,
    value: f64,
) -> Result<(), PolicyConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PolicyConfigError::ThresholdOutOfRange {
            index,
            policy_type,
            key,
            value,
        })
    }
}
