//! The result of a policy that fired.

use serde::Serialize;
use serde_json::{Map, Value};

use super::policy::PolicyType;
use crate::domain::foundation::ValidationError;

/// A triggered escalation.
///
/// Only firing policies produce an outcome; a policy that does not fire
/// yields `None`, never an outcome with `triggered == false`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscalationOutcome {
    policy_id: String,
    policy_type: PolicyType,
    reason: String,
    confidence: f64,
    metadata: Map<String, Value>,
}

impl EscalationOutcome {
    /// Creates an outcome.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if confidence is outside [0, 1] or NaN
    pub fn new(
        policy_id: impl Into<String>,
        policy_type: PolicyType,
        reason: impl Into<String>,
        confidence: f64,
    ) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ValidationError::out_of_range("confidence", 0.0, 1.0, confidence));
        }
        Ok(Self {
            policy_id: policy_id.into(),
            policy_type,
            reason: reason.into(),
            confidence,
            metadata: Map::new(),
        })
    }

    /// Creates an outcome with confidence 1.0.
    pub fn certain(
        policy_id: impl Into<String>,
        policy_type: PolicyType,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            policy_id: policy_id.into(),
            policy_type,
            reason: reason.into(),
            confidence: 1.0,
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn triggered(&self) -> bool {
        true
    }

    pub fn policy_id(&self) -> &str {
        &self.policy_id
    }

    pub fn policy_type(&self) -> PolicyType {
        self.policy_type
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}
