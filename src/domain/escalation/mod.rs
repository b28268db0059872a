//! Escalation module - policies that can hand a conversation to a human.
//!
//! - `policy` - definitions as configured, typed per-kind settings
//! - `handlers` - one evaluator per policy kind
//! - `outcome` - what a firing policy reports
//! - `engine` - priority-ordered evaluation

mod engine;
pub mod handlers;
mod outcome;
mod policy;

pub use engine::{CompiledPolicy, EscalationEngine};
pub use handlers::{PolicyContext, PolicyHandler, Trigger};
pub use outcome::EscalationOutcome;
pub use policy::{
    CompletionConfig, EscalationPolicyDefinition, KeywordConfig, LlmIntentConfig, PolicyConfigError,
    PolicyType, SentimentConfig, TimeoutConfig,
};
