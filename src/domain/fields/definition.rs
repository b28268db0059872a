//! Field definitions - what the agent collects.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Kind of value a field holds; selects the validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Email,
    Phone,
    Url,
    Number,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Url => "url",
            FieldType::Number => "number",
            FieldType::Date => "date",
        }
    }

    /// Human description of the expected format, used when re-prompting.
    pub fn format_hint(&self) -> &'static str {
        match self {
            FieldType::Text => "a short text answer",
            FieldType::Email => "an email address such as name@example.com",
            FieldType::Phone => "a phone number with at least 7 digits, such as +1 555-123-4567",
            FieldType::Url => "a web address starting with http:// or https://",
            FieldType::Number => "a number such as 42 or 3.5",
            FieldType::Date => "a date such as 2024-03-15",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_required() -> bool {
    true
}

/// One named piece of information the agent collects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type", alias = "field_type", default)]
    pub field_type: FieldType,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub validation_pattern: Option<String>,
    #[serde(default)]
    pub prompt_hint: Option<String>,
    #[serde(skip)]
    compiled: PatternCache,
}

/// `validation_pattern` compiled once, on validation or first use.
#[derive(Debug, Clone, Default)]
struct PatternCache(OnceCell<Regex>);

// A cache never makes two definitions differ.
impl PartialEq for PatternCache {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl Eq for PatternCache {}

impl FieldDefinition {
    /// Creates a required field after checking its name.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Result<Self, ValidationError> {
        let def = Self {
            name: name.into().trim().to_string(),
            field_type,
            required: true,
            validation_pattern: None,
            prompt_hint: None,
            compiled: PatternCache::default(),
        };
        def.validate()?;
        Ok(def)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.validation_pattern = Some(pattern.into());
        self.compiled = PatternCache::default();
        self
    }

    /// The compiled `validation_pattern`, if one is set.
    ///
    /// Compiles on first call and reuses the result. If the pattern text was
    /// replaced after caching, the new text is compiled without caching.
    pub fn pattern(&self) -> Result<Option<Cow<'_, Regex>>, regex::Error> {
        let Some(source) = self.validation_pattern.as_deref() else {
            return Ok(None);
        };
        let cached = self.compiled.0.get_or_try_init(|| Regex::new(source))?;
        if cached.as_str() == source {
            Ok(Some(Cow::Borrowed(cached)))
        } else {
            Regex::new(source).map(|re| Some(Cow::Owned(re)))
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.prompt_hint = Some(hint.into());
        self
    }

    /// Checks the name shape and that the optional pattern compiles.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        let well_formed = self.name.chars().all(|c| c.is_alphanumeric() || c == '_')
            && self.name.chars().any(char::is_alphanumeric);
        if !well_formed {
            return Err(ValidationError::invalid_format(
                "name",
                format!(
                    "'{}' must contain only alphanumeric characters and underscores",
                    self.name
                ),
            ));
        }
        self.pattern().map_err(|e| {
            ValidationError::invalid_format(
                "validation_pattern",
                format!("field '{}': {}", self.name, e),
            )
        })?;
        Ok(())
    }
}
