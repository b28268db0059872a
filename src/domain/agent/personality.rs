//! Agent personality - how replies should sound.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Friendly,
    #[default]
    Professional,
    Casual,
    Empathetic,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Friendly => "friendly",
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Empathetic => "empathetic",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Formality {
    Formal,
    #[default]
    Neutral,
    Informal,
}

impl Formality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Formality::Formal => "formal",
            Formality::Neutral => "neutral",
            Formality::Informal => "informal",
        }
    }
}

impl fmt::Display for Formality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// At most this many emojis are offered to the capability.
const EMOJI_SAMPLE: usize = 5;

fn default_style() -> String {
    "concise".to_string()
}

fn default_emojis() -> Vec<String> {
    ["👋", "✅", "📧", "📱", "⚠️"].iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personality {
    #[serde(default)]
    pub tone: Tone,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default)]
    pub formality: Formality,
    #[serde(default)]
    pub emoji_usage: bool,
    #[serde(default = "default_emojis")]
    pub emoji_list: Vec<String>,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            tone: Tone::default(),
            style: default_style(),
            formality: Formality::default(),
            emoji_usage: false,
            emoji_list: default_emojis(),
        }
    }
}

impl Personality {
    /// System prompt prefixed to every reply-generation prompt.
    pub fn system_prompt(&self) -> String {
        let mut lines = vec![
            "You are a conversational assistant collecting information from a user.".to_string(),
            format!("Your tone is {}.", self.tone),
            format!("Your communication style is {}.", self.style.trim()),
            format!("Your formality level is {}.", self.formality),
        ];

        if self.emoji_usage && !self.emoji_list.is_empty() {
            let sample: Vec<&str> = self
                .emoji_list
                .iter()
                .take(EMOJI_SAMPLE)
                .map(String::as_str)
                .collect();
            lines.push(format!("You may use emojis such as: {}", sample.join(", ")));
        } else {
            lines.push("Do not use emojis.".to_string());
        }

        lines.extend(
            [
                "",
                "Guidelines:",
                "- Guide the user through the questions one piece of information at a time.",
                "- Be patient if the user makes a mistake.",
                "- Keep replies short and friendly.",
            ]
            .iter()
            .map(|s| s.to_string()),
        );

        lines.join("\n")
    }
}
