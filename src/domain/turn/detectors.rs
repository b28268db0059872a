//! Correction and off-topic detection.
//!
//! Both detectors try fixed cue patterns first and only consult the text
//! capability when the patterns are inconclusive. A failed capability call
//! resolves to "not a correction" and "on topic" respectively.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::domain::capability::ask;
use crate::domain::conversation::ConversationRecord;
use crate::domain::fields::FieldDefinition;
use crate::ports::{AIProvider, CompletionPurpose};

static CORRECTION_CUES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:no|nope|actually|sorry|wait),?\s*(?:my|the|it'?s?)\s+(\w+)\s+(?:is|should be|was)",
        r"(?:i meant|i mean|that'?s? wrong|correction:?)\s+(?:my|the)?\s*(\w+)?",
        r"(?:let me correct|please change|update)\s+(?:my|the)?\s*(\w+)?",
        r"(?:that'?s? not right|wrong)\s*[,.]?\s*(?:my|the|it'?s?)?\s*(\w+)?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

/// Weaker hints that only count once something has been collected.
const CORRECTION_KEYWORDS: [&str; 6] = ["no,", "actually", "sorry", "wrong", "correct", "meant"];

static OFF_TOPIC_CUES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^(?:hi|hello|hey|what'?s? up|how are you|good morning|good afternoon|good evening)\s*[!.?]?$",
        r"(?i)^(?:what|who|why|how|when|where)\s+(?:are you|is this|do you|can you|did)",
        r"(?i)^(?:tell me (?:a joke|about|more)|what'?s? the weather|help me with something else)",
        r"(?i)^(?:i have a question|can i ask|quick question|unrelated but)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

/// Result of correction detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionDecision {
    pub is_correction: bool,
    /// Collected field being corrected, when one could be identified.
    pub target: Option<String>,
}

impl CorrectionDecision {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn targeting(target: Option<String>) -> Self {
        Self {
            is_correction: true,
            target,
        }
    }
}

/// Matches the cue patterns against the lower-cased utterance.
///
/// Returns `None` when no cue matches. On a match, the captured word is
/// resolved to the first collected field whose name contains it.
pub fn match_correction_cue(utterance: &str, collected: &[String]) -> Option<CorrectionDecision> {
    let lowered = utterance.trim().to_lowercase();
    let captures = CORRECTION_CUES.iter().find_map(|re| re.captures(&lowered))?;
    let target = captures.get(1).and_then(|hint| {
        let hint = hint.as_str();
        collected
            .iter()
            .find(|name| name.to_lowercase().contains(hint))
            .cloned()
    });
    Some(CorrectionDecision::targeting(target))
}

/// True when a weak correction keyword appears in the utterance.
pub fn has_correction_keyword(utterance: &str) -> bool {
    let lowered = utterance.to_lowercase();
    CORRECTION_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Reads a `CORRECTION:<field>` / `CORRECTION:UNKNOWN` / `NOT_CORRECTION` reply.
/// The named field is matched case-insensitively onto collected names.
pub fn parse_correction_reply(reply: &str, collected: &[String]) -> CorrectionDecision {
    let upper = reply.trim().to_uppercase();
    let Some(rest) = upper.strip_prefix("CORRECTION:") else {
        return CorrectionDecision::none();
    };
    let named = rest.trim();
    let target = if named == "UNKNOWN" {
        None
    } else {
        collected
            .iter()
            .find(|name| name.eq_ignore_ascii_case(named))
            .cloned()
    };
    CorrectionDecision::targeting(target)
}

/// Decides whether the utterance corrects previously collected data.
///
/// Nothing can be corrected before a field is collected, so a fresh record
/// never yields a correction.
pub async fn detect_correction(
    utterance: &str,
    record: &ConversationRecord,
    ai: &dyn AIProvider,
) -> CorrectionDecision {
    let collected: Vec<String> = record.collected_data().into_keys().collect();
    if collected.is_empty() {
        return CorrectionDecision::none();
    }

    if let Some(decision) = match_correction_cue(utterance, &collected) {
        debug!(session_id = %record.session_id, target = ?decision.target, "correction cue matched");
        return decision;
    }

    if !has_correction_keyword(utterance) {
        return CorrectionDecision::none();
    }

    let prompt = format!(
        "Decide whether the user is correcting a value they gave earlier.\n\
         \n\
         User message: \"{utterance}\"\n\
         \n\
         Fields collected so far: {fields}\n\
         \n\
         Respond with ONLY one of:\n\
         - CORRECTION:<field_name> if a specific field is being corrected\n\
         - CORRECTION:UNKNOWN if it is a correction but the field is unclear\n\
         - NOT_CORRECTION otherwise\n\
         \n\
         Response:",
        utterance = utterance,
        fields = collected.join(", "),
    );

    match ask(ai, record.session_id, CompletionPurpose::CorrectionCheck, prompt).await {
        Ok(reply) => parse_correction_reply(&reply, &collected),
        Err(e) => {
            warn!(session_id = %record.session_id, error = %e, "correction check failed, treating as new input");
            CorrectionDecision::none()
        }
    }
}

/// True when the trimmed utterance matches a small-talk or topic-change cue.
pub fn matches_off_topic_cue(utterance: &str) -> bool {
    let trimmed = utterance.trim();
    OFF_TOPIC_CUES.iter().any(|re| re.is_match(trimmed))
}

/// Decides whether the utterance ignores the pending field.
pub async fn detect_off_topic(
    utterance: &str,
    pending: &FieldDefinition,
    record: &ConversationRecord,
    ai: &dyn AIProvider,
) -> bool {
    if matches_off_topic_cue(utterance) {
        debug!(session_id = %record.session_id, "off-topic cue matched");
        return true;
    }

    let prompt = format!(
        "Decide whether the user's reply is relevant to the question being asked.\n\
         \n\
         We are collecting: {name} ({kind})\n\
         User's reply: \"{utterance}\"\n\
         \n\
         OFF_TOPIC means the reply asks something unrelated, changes the subject, \
         or makes no attempt to give the requested information.\n\
         ON_TOPIC means the reply tries to give the information (even if incomplete \
         or invalid), asks for clarification, or declines to answer.\n\
         \n\
         Respond with ONLY: ON_TOPIC or OFF_TOPIC\n\
         \n\
         Response:",
        name = pending.name,
        kind = pending.field_type,
        utterance = utterance,
    );

    match ask(ai, record.session_id, CompletionPurpose::OffTopicCheck, prompt).await {
        Ok(reply) => reply.to_uppercase().contains("OFF_TOPIC"),
        Err(e) => {
            warn!(session_id = %record.session_id, error = %e, "off-topic check failed, assuming on topic");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::domain::fields::FieldType;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    mod correction_cues {
        use super::*;

        #[test]
        fn negation_restatement_targets_collected_field() {
            let d = match_correction_cue("No, my email is x@y.com", &names(&["email", "full_name"]))
                .unwrap();
            assert!(d.is_correction);
            assert_eq!(d.target.as_deref(), Some("email"));
        }

        #[test]
        fn hint_matches_by_substring_of_field_name() {
            let d = match_correction_cue("actually my name is Janet", &names(&["full_name"])).unwrap();
            assert_eq!(d.target.as_deref(), Some("full_name"));
        }

        #[test]
        fn cue_without_identifiable_field_has_no_target() {
            let d = match_correction_cue("that's wrong", &names(&["email"])).unwrap();
            assert!(d.is_correction);
            assert!(d.target.is_none());
        }

        #[test]
        fn explicit_request_forms_match() {
            for text in ["Let me correct my phone", "please change the phone", "I meant my phone"] {
                let d = match_correction_cue(text, &names(&["phone"])).unwrap();
                assert_eq!(d.target.as_deref(), Some("phone"), "{}", text);
            }
        }

        #[test]
        fn plain_answer_is_not_a_cue() {
            assert!(match_correction_cue("My name is Jane Doe", &names(&["email"])).is_none());
            assert!(match_correction_cue("jane@example.com", &names(&[])).is_none());
        }

        #[test]
        fn weak_keywords() {
            assert!(has_correction_keyword("Sorry I typed it badly"));
            assert!(has_correction_keyword("no, not that"));
            assert!(!has_correction_keyword("my number is 555"));
        }
    }

    mod correction_replies {
        use super::*;

        #[test]
        fn maps_named_field_case_insensitively() {
            let d = parse_correction_reply("correction:Email", &names(&["email"]));
            assert_eq!(d, CorrectionDecision::targeting(Some("email".into())));
        }

        #[test]
        fn unknown_and_unmatched_fields_have_no_target() {
            assert_eq!(
                parse_correction_reply("CORRECTION:UNKNOWN", &names(&["email"])),
                CorrectionDecision::targeting(None)
            );
            assert_eq!(
                parse_correction_reply("CORRECTION:phone", &names(&["email"])),
                CorrectionDecision::targeting(None)
            );
        }

        #[test]
        fn anything_else_is_not_a_correction() {
            assert_eq!(
                parse_correction_reply("NOT_CORRECTION", &names(&["email"])),
                CorrectionDecision::none()
            );
            assert_eq!(parse_correction_reply("maybe?", &names(&["email"])), CorrectionDecision::none());
        }
    }

    mod correction_detection {
        use super::*;

        fn record_with_email() -> ConversationRecord {
            let mut record = ConversationRecord::new();
            record.record_attempt("email", Some("a@b.com".into()), true);
            record
        }

        #[tokio::test]
        async fn cue_match_skips_capability() {
            let ai = MockAIProvider::new();
            let d = detect_correction("No, my email is x@y.com", &record_with_email(), &ai).await;
            assert_eq!(d.target.as_deref(), Some("email"));
            assert_eq!(ai.call_count(), 0);
        }

        #[tokio::test]
        async fn keyword_with_collected_data_asks_capability() {
            let ai = MockAIProvider::new().with_response("CORRECTION:EMAIL");
            let d = detect_correction("sorry, use x@y.com instead", &record_with_email(), &ai).await;
            assert_eq!(d.target.as_deref(), Some("email"));
            assert_eq!(ai.call_count(), 1);
            assert_eq!(ai.get_calls()[0].metadata.purpose, CompletionPurpose::CorrectionCheck);
        }

        #[tokio::test]
        async fn keyword_without_collected_data_is_not_a_correction() {
            let ai = MockAIProvider::new();
            let d = detect_correction("sorry, I am late", &ConversationRecord::new(), &ai).await;
            assert_eq!(d, CorrectionDecision::none());
            assert_eq!(ai.call_count(), 0);
        }

        #[tokio::test]
        async fn cue_on_fresh_record_is_not_a_correction() {
            let ai = MockAIProvider::new();
            let d = detect_correction(
                "Actually, the weather is lovely today",
                &ConversationRecord::new(),
                &ai,
            )
            .await;
            assert_eq!(d, CorrectionDecision::none());
            assert_eq!(ai.call_count(), 0);
        }

        #[tokio::test]
        async fn capability_failure_is_not_a_correction() {
            let ai = MockAIProvider::new().with_error(MockError::Unavailable {
                message: "down".into(),
            });
            let d = detect_correction("sorry, use x@y.com instead", &record_with_email(), &ai).await;
            assert_eq!(d, CorrectionDecision::none());
        }
    }

    mod off_topic {
        use super::*;

        fn pending() -> FieldDefinition {
            FieldDefinition::new("email", FieldType::Email).unwrap()
        }

        #[test]
        fn cue_patterns() {
            for text in [
                "hello!",
                "  Good morning ",
                "Who are you",
                "what is this thing",
                "tell me a joke",
                "What's the weather like",
                "Quick question about pricing",
            ] {
                assert!(matches_off_topic_cue(text), "{}", text);
            }
            for text in ["hello, my email is x@y.com", "x@y.com", "my name is Jane"] {
                assert!(!matches_off_topic_cue(text), "{}", text);
            }
        }

        #[tokio::test]
        async fn cue_match_skips_capability() {
            let ai = MockAIProvider::new();
            assert!(detect_off_topic("hey", &pending(), &ConversationRecord::new(), &ai).await);
            assert_eq!(ai.call_count(), 0);
        }

        #[tokio::test]
        async fn capability_classifies_ambiguous_replies() {
            let ai = MockAIProvider::new().with_response("OFF_TOPIC");
            assert!(detect_off_topic("I like trains", &pending(), &ConversationRecord::new(), &ai).await);

            let ai = MockAIProvider::new().with_response("ON_TOPIC");
            assert!(!detect_off_topic("x@y.com", &pending(), &ConversationRecord::new(), &ai).await);
        }

        #[tokio::test]
        async fn capability_failure_means_on_topic() {
            let ai = MockAIProvider::new().with_error(MockError::AuthenticationFailed);
            assert!(!detect_off_topic("I like trains", &pending(), &ConversationRecord::new(), &ai).await);
        }
    }
}
