//! Reply prompts and their deterministic fallbacks.

use std::collections::BTreeMap;

use crate::domain::agent::Personality;
use crate::domain::conversation::ConversationRecord;
use crate::domain::fields::FieldDefinition;

/// Messages of history shown when asking for a field.
const FIELD_PROMPT_HISTORY: usize = 6;

pub const ESCALATION_REPLY: &str = "I understand you'd like to speak with a human agent. \
     I'm connecting you now. Thank you for your patience.";

pub const DEFAULT_ESCALATION_REASON: &str = "User requested human agent";

pub const COMPLETION_FALLBACK: &str = "Thank you! We have all the information we need.";

pub const NOTHING_LEFT_REPLY: &str = "Thank you for providing all the information.";

pub fn field_prompt_fallback(field: &FieldDefinition) -> String {
    format!("Could you please provide your {}?", field.name)
}

pub fn redirect_fallback(field: &FieldDefinition) -> String {
    format!("I appreciate that! Could you please provide your {}?", field.name)
}

pub fn format_help_fallback(field: &FieldDefinition) -> String {
    format!(
        "Sorry, I couldn't get a valid {} from that. Please provide {}.",
        field.name,
        field.field_type.format_hint()
    )
}

fn render_collected(collected: &BTreeMap<String, String>) -> String {
    if collected.is_empty() {
        return "none yet".to_string();
    }
    collected
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Asks for `field`, with recent history and what is already known.
pub fn field_prompt(
    personality: &Personality,
    field: &FieldDefinition,
    record: &ConversationRecord,
) -> String {
    let mut lines = vec![
        personality.system_prompt(),
        String::new(),
        "Conversation so far:".to_string(),
    ];
    lines.extend(
        record
            .recent_messages(FIELD_PROMPT_HISTORY)
            .iter()
            .map(|m| m.as_history_line()),
    );
    lines.push(String::new());
    lines.push(format!(
        "Already collected: {}",
        render_collected(&record.collected_data())
    ));
    lines.push(String::new());
    lines.push(format!(
        "Next field to collect: {} (type: {})",
        field.name, field.field_type
    ));
    if let Some(hint) = &field.prompt_hint {
        lines.push(format!("Hint for asking: {}", hint));
    }
    lines.push(String::new());
    lines.push("Write a short, natural message asking for this information.".to_string());
    lines.join("\n")
}

/// Acknowledges a tangent and steers back to `field`.
pub fn redirect_prompt(personality: &Personality, field: &FieldDefinition, utterance: &str) -> String {
    format!(
        "{system}\n\
         \n\
         The user went off-topic. Acknowledge their message briefly and without \
         being dismissive, then ask for their {name}.\n\
         \n\
         User's message: \"{utterance}\"\n\
         Field needed: {name} ({kind})\n\
         \n\
         Keep it short and conversational.",
        system = personality.system_prompt(),
        name = field.name,
        kind = field.field_type,
        utterance = utterance,
    )
}

/// Explains the expected format after a failed extraction.
pub fn format_help_prompt(
    personality: &Personality,
    field: &FieldDefinition,
    utterance: &str,
) -> String {
    format!(
        "{system}\n\
         \n\
         The user's reply did not contain a valid {name}.\n\
         \n\
         User's message: \"{utterance}\"\n\
         Field needed: {name} (type: {kind}, expected: {hint})\n\
         \n\
         Explain the expected format in one sentence and ask them to try again.",
        system = personality.system_prompt(),
        name = field.name,
        kind = field.field_type,
        hint = field.field_type.format_hint(),
        utterance = utterance,
    )
}

/// Closing acknowledgement referencing the collected data.
pub fn completion_prompt(personality: &Personality, collected: &BTreeMap<String, String>) -> String {
    format!(
        "{system}\n\
         \n\
         All the information has been collected:\n\
         {data}\n\
         \n\
         Write a brief thank-you (1-2 sentences) confirming it was received.",
        system = personality.system_prompt(),
        data = render_collected(collected),
    )
}
