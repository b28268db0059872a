//! LLM intent policy - asks the capability to match escalation intents.

use serde_json::{json, Map};
use tracing::warn;

use super::{PolicyContext, Trigger};
use crate::domain::capability::ask;
use crate::domain::escalation::policy::LlmIntentConfig;
use crate::ports::{AIProvider, CompletionPurpose};

/// Intents used when none are configured.
pub const DEFAULT_INTENTS: [&str; 5] = [
    "user wants to speak with a human",
    "user is requesting a human agent",
    "user wants to escalate the conversation",
    "user is expressing extreme frustration",
    "user is threatening to leave or cancel",
];

#[derive(Debug, Clone, PartialEq)]
pub struct LlmIntentHandler {
    config: LlmIntentConfig,
}

/// Parsed `DETECTED:` / `CONFIDENCE:` reply.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentReply {
    pub intent: Option<String>,
    pub confidence: Option<f64>,
}

impl LlmIntentHandler {
    pub fn new(config: LlmIntentConfig) -> Self {
        Self { config }
    }

    /// Configured intents, or the default set when none are configured.
    pub fn intents(&self) -> Vec<String> {
        if self.config.intents.is_empty() {
            DEFAULT_INTENTS.iter().map(|s| s.to_string()).collect()
        } else {
            self.config.intents.clone()
        }
    }

    pub async fn evaluate(&self, ctx: &PolicyContext<'_>, ai: &dyn AIProvider) -> Option<Trigger> {
        let intents = self.intents();
        let prompt = build_prompt(ctx.utterance, &intents);
        let reply = match ask(ai, ctx.record.session_id, CompletionPurpose::IntentDetection, prompt).await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session_id = %ctx.record.session_id, error = %e, "intent check failed, not escalating");
                return None;
            }
        };

        let parsed = parse_reply(&reply);
        let (Some(intent), Some(confidence)) = (parsed.intent, parsed.confidence) else {
            return None;
        };
        if confidence < self.config.confidence_threshold {
            return None;
        }

        let mut metadata = Map::new();
        metadata.insert("detected_intent".into(), json!(intent));
        metadata.insert("confidence".into(), json!(confidence));
        metadata.insert("analyzed_message".into(), json!(ctx.utterance));
        metadata.insert("configured_intents".into(), json!(intents));
        Some(Trigger {
            confidence,
            metadata,
        })
    }
}

fn build_prompt(utterance: &str, intents: &[String]) -> String {
    let intent_list = intents
        .iter()
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Decide whether the user message below matches any of these escalation intents:\n\
         {intent_list}\n\
         \n\
         User message: \"{utterance}\"\n\
         \n\
         If it matches one of the intents, respond with:\n\
         DETECTED: [intent description]\n\
         CONFIDENCE: [0.0-1.0]\n\
         \n\
         If no intent matches, respond with:\n\
         DETECTED: NONE\n\
         CONFIDENCE: 0.0\n\
         \n\
         Use exactly this format and nothing else.\n\
         \n\
         Response:",
        intent_list = intent_list,
        utterance = utterance,
    )
}

/// Reads the two-line reply. `NONE` means no intent; a confidence that is
/// missing, unparseable or NaN is `None`, otherwise clamped to [0, 1].
pub fn parse_reply(reply: &str) -> IntentReply {
    let mut parsed = IntentReply {
        intent: None,
        confidence: None,
    };
    for line in reply.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("DETECTED:") {
            let intent = rest.trim();
            parsed.intent = if intent.is_empty() || intent.eq_ignore_ascii_case("NONE") {
                None
            } else {
                Some(intent.to_string())
            };
        } else if let Some(rest) = line.strip_prefix("CONFIDENCE:") {
            parsed.confidence = rest
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|c| !c.is_nan())
                .map(|c| c.clamp(0.0, 1.0));
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::domain::conversation::ConversationRecord;
    use crate::domain::foundation::Timestamp;

    fn handler(intents: &[&str], threshold: f64) -> LlmIntentHandler {
        LlmIntentHandler::new(LlmIntentConfig {
            intents: intents.iter().map(|s| s.to_string()).collect(),
            confidence_threshold: threshold,
        })
    }

    fn ctx<'a>(record: &'a ConversationRecord, utterance: &'a str) -> PolicyContext<'a> {
        PolicyContext {
            record,
            utterance,
            now: Timestamp::now(),
        }
    }

    mod parsing {
        use super::*;

        #[test]
        fn reads_intent_and_confidence() {
            let parsed = parse_reply("DETECTED: user wants a human\nCONFIDENCE: 0.92");
            assert_eq!(parsed.intent.as_deref(), Some("user wants a human"));
            assert_eq!(parsed.confidence, Some(0.92));
        }

        #[test]
        fn none_means_no_intent() {
            let parsed = parse_reply("DETECTED: NONE\nCONFIDENCE: 0.0");
            assert!(parsed.intent.is_none());
        }

        #[test]
        fn clamps_confidence() {
            assert_eq!(parse_reply("CONFIDENCE: 1.4").confidence, Some(1.0));
        }

        #[test]
        fn unparseable_or_nan_confidence_is_none() {
            assert_eq!(parse_reply("DETECTED: x\nCONFIDENCE: high").confidence, None);
            assert_eq!(parse_reply("DETECTED: x\nCONFIDENCE: NaN").confidence, None);
            assert_eq!(parse_reply("DETECTED: x").confidence, None);
        }
    }

    mod evaluation {
        use super::*;

        #[tokio::test]
        async fn fires_on_confident_detection() {
            let record = ConversationRecord::new();
            let ai = MockAIProvider::new()
                .with_response("DETECTED: user wants to speak with a human\nCONFIDENCE: 0.95");
            let trigger = handler(&[], 0.8)
                .evaluate(&ctx(&record, "get me a person"), &ai)
                .await
                .unwrap();
            assert_eq!(trigger.confidence, 0.95);
            assert_eq!(
                trigger.metadata.get("detected_intent"),
                Some(&json!("user wants to speak with a human"))
            );
        }

        #[tokio::test]
        async fn low_confidence_does_not_fire() {
            let record = ConversationRecord::new();
            let ai = MockAIProvider::new().with_response("DETECTED: frustrated\nCONFIDENCE: 0.5");
            assert!(handler(&[], 0.8).evaluate(&ctx(&record, "hmm"), &ai).await.is_none());
        }

        #[tokio::test]
        async fn missing_confidence_does_not_fire_even_at_zero_threshold() {
            let record = ConversationRecord::new();
            let ai = MockAIProvider::new().with_response("DETECTED: frustrated");
            assert!(handler(&[], 0.0).evaluate(&ctx(&record, "hmm"), &ai).await.is_none());
        }

        #[tokio::test]
        async fn capability_failure_does_not_fire() {
            let record = ConversationRecord::new();
            let ai = MockAIProvider::new().with_error(MockError::Timeout { timeout_secs: 30 });
            assert!(handler(&[], 0.0).evaluate(&ctx(&record, "hmm"), &ai).await.is_none());
        }

        #[tokio::test]
        async fn default_intents_are_listed_in_prompt() {
            let record = ConversationRecord::new();
            let ai = MockAIProvider::new().with_response("DETECTED: NONE\nCONFIDENCE: 0.0");
            handler(&[], 0.8).evaluate(&ctx(&record, "hi"), &ai).await;
            let prompt = &ai.get_calls()[0].prompt;
            for intent in DEFAULT_INTENTS {
                assert!(prompt.contains(intent));
            }
        }

        #[tokio::test]
        async fn configured_intents_replace_defaults() {
            let record = ConversationRecord::new();
            let ai = MockAIProvider::new().with_response("DETECTED: NONE\nCONFIDENCE: 0.0");
            handler(&["user asks for a refund"], 0.8)
                .evaluate(&ctx(&record, "hi"), &ai)
                .await;
            let prompt = &ai.get_calls()[0].prompt;
            assert!(prompt.contains("- user asks for a refund"));
            assert!(!prompt.contains(DEFAULT_INTENTS[0]));
        }
    }
}
