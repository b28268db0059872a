//! Keyword policy - substring or whole-word match on the utterance.

use serde_json::{json, Map};

use super::Trigger;
use crate::domain::escalation::policy::KeywordConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordHandler {
    config: KeywordConfig,
}

impl KeywordHandler {
    pub fn new(config: KeywordConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KeywordConfig {
        &self.config
    }

    /// Returns the first configured keyword found in the utterance.
    pub fn matched_keyword(&self, utterance: &str) -> Option<&str> {
        let fold = |s: &str| {
            if self.config.case_sensitive {
                s.to_string()
            } else {
                s.to_lowercase()
            }
        };
        let haystack = fold(utterance);
        let words: Vec<&str> = haystack.split_whitespace().collect();

        self.config
            .keywords
            .iter()
            .find(|keyword| {
                let needle = fold(keyword);
                if self.config.match_whole_word {
                    words.contains(&needle.as_str())
                } else {
                    haystack.contains(&needle)
                }
            })
            .map(String::as_str)
    }

    pub fn check(&self, utterance: &str) -> Option<Trigger> {
        let keyword = self.matched_keyword(utterance)?;
        let mut metadata = Map::new();
        metadata.insert("matched_keyword".into(), json!(keyword));
        Some(Trigger::certain(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn handler(keywords: &[&str], case_sensitive: bool, match_whole_word: bool) -> KeywordHandler {
        KeywordHandler::new(KeywordConfig {
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            case_sensitive,
            match_whole_word,
        })
    }

    #[test]
    fn substring_match_is_case_insensitive_by_default() {
        let h = handler(&["human"], false, false);
        let trigger = h.check("let me talk to a HUMAN please").unwrap();
        assert_eq!(trigger.confidence, 1.0);
        assert_eq!(trigger.metadata.get("matched_keyword"), Some(&json!("human")));
    }

    #[test]
    fn substring_match_finds_keyword_inside_words() {
        assert!(handler(&["human"], false, false).check("humanity").is_some());
    }

    #[test]
    fn whole_word_ignores_partial_matches() {
        let h = handler(&["human"], false, true);
        assert!(h.check("humanity is great").is_none());
        assert!(h.check("get me a human now").is_some());
    }

    #[test]
    fn case_sensitive_respects_case() {
        let h = handler(&["Manager"], true, false);
        assert!(h.check("I want a manager").is_none());
        assert!(h.check("I want a Manager").is_some());
    }

    #[test]
    fn empty_keyword_list_never_fires() {
        assert!(handler(&[], false, false).check("human").is_none());
    }

    #[test]
    fn reports_first_configured_keyword_that_matches() {
        let h = handler(&["agent", "human"], false, false);
        assert_eq!(h.matched_keyword("human or agent"), Some("agent"));
    }

    proptest! {
        #[test]
        fn case_insensitive_matching_ignores_case(
            utterance in "[a-zA-Z ]{0,40}",
            keyword in "[a-zA-Z]{1,6}",
            whole_word in any::<bool>(),
        ) {
            let base = handler(&[keyword.as_str()], false, whole_word);
            let upper = handler(&[keyword.to_uppercase().as_str()], false, whole_word);
            let lower = handler(&[keyword.to_lowercase().as_str()], false, whole_word);

            let expected = base.check(&utterance).is_some();
            prop_assert_eq!(base.check(&utterance.to_uppercase()).is_some(), expected);
            prop_assert_eq!(base.check(&utterance.to_lowercase()).is_some(), expected);
            prop_assert_eq!(upper.check(&utterance).is_some(), expected);
            prop_assert_eq!(lower.check(&utterance).is_some(), expected);
        }
    }
}
