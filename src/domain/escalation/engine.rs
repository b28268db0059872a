//! Escalation engine - evaluates enabled policies in fixed priority order.
//!
//! Order: keyword < timeout < sentiment < llm_intent < completion. Policies
//! of the same type keep their configuration order. `evaluate` stops at the
//! first policy that fires; `evaluate_all` runs every policy.

use tracing::{debug, warn};

use super::handlers::{PolicyContext, PolicyHandler};
use super::outcome::EscalationOutcome;
use super::policy::{EscalationPolicyDefinition, PolicyConfigError};
use crate::ports::AIProvider;

/// A policy ready for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPolicy {
    /// `policy_{index}_{type}`, where index is the configuration position.
    pub id: String,
    pub reason: String,
    pub handler: PolicyHandler,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EscalationEngine {
    policies: Vec<CompiledPolicy>,
}

impl EscalationEngine {
    /// Compiles the enabled policies, rejecting any malformed one.
    ///
    /// Disabled policies are still parsed so a typo does not hide until the
    /// policy is switched on.
    pub fn from_definitions(
        definitions: &[EscalationPolicyDefinition],
    ) -> Result<Self, PolicyConfigError> {
        let mut policies = Vec::new();
        for (index, def) in definitions.iter().enumerate() {
            let handler = PolicyHandler::from_definition(index, def)?;
            if !def.enabled {
                continue;
            }
            policies.push(CompiledPolicy {
                id: format!("policy_{}_{}", index, def.policy_type),
                reason: def.reason.trim().to_string(),
                handler,
            });
        }
        // Stable: ties keep configuration order.
        policies.sort_by_key(|p| p.handler.policy_type().priority());
        Ok(Self { policies })
    }

    /// True when at least one enabled policy exists.
    pub fn has_policies(&self) -> bool {
        !self.policies.is_empty()
    }

    /// Enabled policies in evaluation order.
    pub fn policies(&self) -> &[CompiledPolicy] {
        &self.policies
    }

    /// Returns the first outcome in priority order, if any policy fires.
    pub async fn evaluate(
        &self,
        ctx: &PolicyContext<'_>,
        ai: &dyn AIProvider,
    ) -> Option<EscalationOutcome> {
        for policy in &self.policies {
            if let Some(outcome) = self.run(policy, ctx, ai).await {
                return Some(outcome);
            }
        }
        None
    }

    /// Returns every outcome, in priority order.
    pub async fn evaluate_all(
        &self,
        ctx: &PolicyContext<'_>,
        ai: &dyn AIProvider,
    ) -> Vec<EscalationOutcome> {
        let mut outcomes = Vec::new();
        for policy in &self.policies {
            if let Some(outcome) = self.run(policy, ctx, ai).await {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    async fn run(
        &self,
        policy: &CompiledPolicy,
        ctx: &PolicyContext<'_>,
        ai: &dyn AIProvider,
    ) -> Option<EscalationOutcome> {
        let trigger = policy.handler.evaluate(ctx, ai).await?;
        let policy_type = policy.handler.policy_type();
        match EscalationOutcome::new(&policy.id, policy_type, &policy.reason, trigger.confidence) {
            Ok(outcome) => {
                debug!(
                    session_id = %ctx.record.session_id,
                    policy_id = %policy.id,
                    confidence = trigger.confidence,
                    "escalation policy fired"
                );
                Some(outcome.with_metadata(trigger.metadata))
            }
            Err(e) => {
                warn!(policy_id = %policy.id, error = %e, "discarding out-of-range trigger");
                None
            }
        }
    }
}
