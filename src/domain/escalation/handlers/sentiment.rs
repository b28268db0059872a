//! Sentiment policy - asks the capability to rate negativity.

use serde_json::{json, Map};
use tracing::warn;

use super::{PolicyContext, Trigger};
use crate::domain::capability::ask;
use crate::domain::escalation::policy::SentimentConfig;
use crate::ports::{AIProvider, CompletionPurpose};

const HISTORY_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentHandler {
    config: SentimentConfig,
}

impl SentimentHandler {
    pub fn new(config: SentimentConfig) -> Self {
        Self { config }
    }

    pub async fn evaluate(&self, ctx: &PolicyContext<'_>, ai: &dyn AIProvider) -> Option<Trigger> {
        let prompt = self.build_prompt(ctx);
        let reply = match ask(ai, ctx.record.session_id, CompletionPurpose::Sentiment, prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session_id = %ctx.record.session_id, error = %e, "sentiment check failed, not escalating");
                return None;
            }
        };

        let Some(score) = parse_score(&reply) else {
            warn!(session_id = %ctx.record.session_id, reply = %reply, "unparseable sentiment score");
            return None;
        };
        if score < self.config.threshold {
            return None;
        }

        let mut metadata = Map::new();
        metadata.insert("sentiment_score".into(), json!(score));
        metadata.insert("threshold".into(), json!(self.config.threshold));
        metadata.insert("analyzed_message".into(), json!(ctx.utterance));
        Some(Trigger {
            confidence: score,
            metadata,
        })
    }

    fn build_prompt(&self, ctx: &PolicyContext<'_>) -> String {
        let mut context = String::new();
        if self.config.include_history && !ctx.record.messages.is_empty() {
            context.push_str("Conversation context:\n");
            for msg in ctx.record.recent_messages(HISTORY_WINDOW) {
                context.push_str(&msg.as_history_line());
                context.push('\n');
            }
            context.push('\n');
        }

        format!(
            "{context}Rate how frustrated, angry or otherwise negative this message is \
             on a scale from 0.0 to 1.0.\n\
             \n\
             Message: \"{utterance}\"\n\
             \n\
             Scale:\n\
             - 0.0 = positive or neutral\n\
             - 0.5 = mildly negative or slightly frustrated\n\
             - 1.0 = very negative, angry or extremely frustrated\n\
             \n\
             Respond with ONLY a decimal number between 0.0 and 1.0.\n\
             \n\
             Sentiment score:",
            context = context,
            utterance = ctx.utterance,
        )
    }
}

/// Parses a bare number and clamps it to [0, 1].
fn parse_score(reply: &str) -> Option<f64> {
    let score: f64 = reply.trim().parse().ok()?;
    if score.is_nan() {
        return None;
    }
    Some(score.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::domain::conversation::{ConversationRecord, MessageRole};
    use crate::domain::foundation::Timestamp;

    fn handler(threshold: f64, include_history: bool) -> SentimentHandler {
        SentimentHandler::new(SentimentConfig {
            threshold,
            include_history,
        })
    }

    fn ctx<'a>(record: &'a ConversationRecord, utterance: &'a str) -> PolicyContext<'a> {
        PolicyContext {
            record,
            utterance,
            now: Timestamp::now(),
        }
    }

    #[test]
    fn score_parsing_clamps_and_rejects_garbage() {
        assert_eq!(parse_score("0.85"), Some(0.85));
        assert_eq!(parse_score(" 1.7 "), Some(1.0));
        assert_eq!(parse_score("-2"), Some(0.0));
        assert_eq!(parse_score("NaN"), None);
        assert_eq!(parse_score("very angry"), None);
    }

    #[tokio::test]
    async fn fires_at_or_above_threshold() {
        let record = ConversationRecord::new();
        let ai = MockAIProvider::new().with_response("0.7");
        let trigger = handler(0.7, false)
            .evaluate(&ctx(&record, "this is ridiculous"), &ai)
            .await
            .unwrap();
        assert_eq!(trigger.confidence, 0.7);
        assert_eq!(trigger.metadata.get("analyzed_message"), Some(&json!("this is ridiculous")));
    }

    #[tokio::test]
    async fn stays_quiet_below_threshold() {
        let record = ConversationRecord::new();
        let ai = MockAIProvider::new().with_response("0.2");
        assert!(handler(0.7, false).evaluate(&ctx(&record, "fine"), &ai).await.is_none());
    }

    #[tokio::test]
    async fn clamped_score_becomes_confidence() {
        let record = ConversationRecord::new();
        let ai = MockAIProvider::new().with_response("3.0");
        let trigger = handler(0.5, false).evaluate(&ctx(&record, "argh"), &ai).await.unwrap();
        assert_eq!(trigger.confidence, 1.0);
    }

    #[tokio::test]
    async fn capability_failure_is_no_outcome() {
        let record = ConversationRecord::new();
        let ai = MockAIProvider::new().with_error(MockError::Network {
            message: "reset".into(),
        });
        assert!(handler(0.0, false).evaluate(&ctx(&record, "x"), &ai).await.is_none());
    }

    #[tokio::test]
    async fn unparseable_reply_is_no_outcome() {
        let record = ConversationRecord::new();
        let ai = MockAIProvider::new().with_response("quite negative");
        assert!(handler(0.0, false).evaluate(&ctx(&record, "x"), &ai).await.is_none());
    }

    #[tokio::test]
    async fn history_is_included_when_enabled() {
        let mut record = ConversationRecord::new();
        for i in 0..7 {
            record.add_message(MessageRole::User, format!("msg {}", i));
        }
        let ai = MockAIProvider::new().with_response("0.1");
        handler(0.7, true).evaluate(&ctx(&record, "x"), &ai).await;

        let prompt = &ai.get_calls()[0].prompt;
        assert!(prompt.starts_with("Conversation context:"));
        assert!(prompt.contains("User: msg 6"));
        assert!(prompt.contains("User: msg 2"));
        assert!(!prompt.contains("User: msg 1"));
    }

    #[tokio::test]
    async fn history_is_omitted_by_default() {
        let mut record = ConversationRecord::new();
        record.add_message(MessageRole::Agent, "Hello!");
        let ai = MockAIProvider::new().with_response("0.1");
        handler(0.7, false).evaluate(&ctx(&record, "x"), &ai).await;
        assert!(!ai.get_calls()[0].prompt.contains("Conversation context:"));
    }
}
