//! Policy handlers - one per policy type, selected by the type tag.

mod completion;
mod keyword;
mod llm_intent;
mod sentiment;
mod timeout;

pub use completion::CompletionHandler;
pub use keyword::KeywordHandler;
pub use llm_intent::{parse_reply as parse_intent_reply, IntentReply, LlmIntentHandler, DEFAULT_INTENTS};
pub use sentiment::SentimentHandler;
pub use timeout::TimeoutHandler;

use serde_json::{Map, Value};

use super::policy::{
    check_unit_range, parse_settings, EscalationPolicyDefinition, LlmIntentConfig,
    PolicyConfigError, PolicyType, SentimentConfig, TimeoutConfig,
};
use crate::domain::conversation::ConversationRecord;
use crate::domain::foundation::Timestamp;
use crate::ports::AIProvider;

/// What a handler sees while evaluating one turn.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub record: &'a ConversationRecord,
    pub utterance: &'a str,
    pub now: Timestamp,
}

/// A handler firing, before the engine attaches policy identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub confidence: f64,
    pub metadata: Map<String, Value>,
}

impl Trigger {
    pub fn certain(metadata: Map<String, Value>) -> Self {
        Self {
            confidence: 1.0,
            metadata,
        }
    }
}

/// Closed set of policy handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyHandler {
    Keyword(KeywordHandler),
    Timeout(TimeoutHandler),
    Sentiment(SentimentHandler),
    LlmIntent(LlmIntentHandler),
    Completion(CompletionHandler),
}

impl PolicyHandler {
    /// Builds the handler for a definition, parsing its settings.
    ///
    /// `index` is the policy's position in configuration and only shows up
    /// in error messages.
    pub fn from_definition(
        index: usize,
        def: &EscalationPolicyDefinition,
    ) -> Result<Self, PolicyConfigError> {
        if def.reason.trim().is_empty() {
            return Err(PolicyConfigError::EmptyReason {
                index,
                policy_type: def.policy_type,
            });
        }

        let handler = match def.policy_type {
            PolicyType::Keyword => {
                PolicyHandler::Keyword(KeywordHandler::new(parse_settings(index, def)?))
            }
            PolicyType::Timeout => {
                let config: TimeoutConfig = parse_settings(index, def)?;
                if config.max_duration_seconds.is_nan() || config.max_duration_seconds < 0.0 {
                    return Err(PolicyConfigError::malformed(
                        index,
                        def.policy_type,
                        "max_duration_seconds must be a non-negative number",
                    ));
                }
                PolicyHandler::Timeout(TimeoutHandler::new(config))
            }
            PolicyType::Sentiment => {
                let config: SentimentConfig = parse_settings(index, def)?;
                check_unit_range(index, def.policy_type, "threshold", config.threshold)?;
                PolicyHandler::Sentiment(SentimentHandler::new(config))
            }
            PolicyType::LlmIntent => {
                let config: LlmIntentConfig = parse_settings(index, def)?;
                check_unit_range(
                    index,
                    def.policy_type,
                    "confidence_threshold",
                    config.confidence_threshold,
                )?;
                PolicyHandler::LlmIntent(LlmIntentHandler::new(config))
            }
            PolicyType::Completion => {
                PolicyHandler::Completion(CompletionHandler::new(parse_settings(index, def)?))
            }
        };
        Ok(handler)
    }

    pub fn policy_type(&self) -> PolicyType {
        match self {
            PolicyHandler::Keyword(_) => PolicyType::Keyword,
            PolicyHandler::Timeout(_) => PolicyType::Timeout,
            PolicyHandler::Sentiment(_) => PolicyType::Sentiment,
            PolicyHandler::LlmIntent(_) => PolicyType::LlmIntent,
            PolicyHandler::Completion(_) => PolicyType::Completion,
        }
    }

    /// Evaluates the policy. Capability-backed handlers swallow capability
    /// failures and return `None`.
    pub async fn evaluate(&self, ctx: &PolicyContext<'_>, ai: &dyn AIProvider) -> Option<Trigger> {
        match self {
            PolicyHandler::Keyword(h) => h.check(ctx.utterance),
            PolicyHandler::Timeout(h) => h.check(ctx.record, ctx.now),
            PolicyHandler::Sentiment(h) => h.evaluate(ctx, ai).await,
            PolicyHandler::LlmIntent(h) => h.evaluate(ctx, ai).await,
            PolicyHandler::Completion(h) => h.check(ctx.record),
        }
    }
}
