//! Extraction contract between the turn machine and the text capability.
//!
//! The capability answers an extraction prompt with either the bare value or
//! one of two sentinels. Both sentinels mean "nothing usable was extracted".

use super::definition::FieldDefinition;

/// Sentinel: the utterance does not contain the requested information.
pub const NOT_PROVIDED: &str = "NOT_PROVIDED";

/// Sentinel: the information is present but malformed for the field type.
pub const INVALID: &str = "INVALID";

/// Interpreted capability reply to an extraction prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Value(String),
    NotProvided,
    Invalid,
}

impl Extraction {
    /// Returns the extracted value, if any.
    pub fn into_value(self) -> Option<String> {
        match self {
            Extraction::Value(v) => Some(v),
            Extraction::NotProvided | Extraction::Invalid => None,
        }
    }
}

/// Parses a raw capability reply.
///
/// Surrounding whitespace and a single pair of wrapping quotes are removed.
/// An empty reply counts as `NotProvided`.
pub fn parse_extraction_reply(reply: &str) -> Extraction {
    let trimmed = reply.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim();

    match unquoted {
        "" | NOT_PROVIDED => Extraction::NotProvided,
        INVALID => Extraction::Invalid,
        value => Extraction::Value(value.to_string()),
    }
}

/// Builds the prompt asking the capability to pull one field out of an utterance.
pub fn build_extraction_prompt(field: &FieldDefinition, utterance: &str) -> String {
    format!(
        "Extract the {name} ({kind}) from the user's message.\n\
         \n\
         User message: \"{utterance}\"\n\
         \n\
         Field to extract: {name}\n\
         Field type: {kind}\n\
         Required: {required}\n\
         \n\
         Instructions:\n\
         - If the user provided a valid {kind}, respond with ONLY the extracted value.\n\
         - If the information is missing or unclear, respond with \"{not_provided}\".\n\
         - If the value looks wrong for the field type, respond with \"{invalid}\".\n\
         - Do not add any other text.\n\
         \n\
         Response:",
        name = field.name,
        kind = field.field_type,
        required = field.required,
        utterance = utterance,
        not_provided = NOT_PROVIDED,
        invalid = INVALID,
    )
}
