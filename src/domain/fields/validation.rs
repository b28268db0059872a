//! Type and pattern validation of extracted field values.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::definition::{FieldDefinition, FieldType};
use super::extraction::{INVALID, NOT_PROVIDED};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("static regex")
});

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\s\-()+]+$").expect("static regex"));

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://\S+$").expect("static regex"));

const MIN_PHONE_DIGITS: usize = 7;

/// Why a value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidValue {
    #[error("value is empty")]
    Empty,

    #[error("value is the extraction sentinel {0}")]
    Sentinel(String),

    #[error("value is not a valid {0}")]
    Format(FieldType),

    #[error("value does not match pattern '{0}'")]
    PatternMismatch(String),

    #[error("validation pattern '{0}' does not compile")]
    BadPattern(String),
}

/// Validates a value against the field's type rule and optional pattern.
///
/// The pattern is anchored at the start of the value only, so `[0-9]{5}`
/// accepts `12345-6789`.
pub fn validate_value(field: &FieldDefinition, value: &str) -> Result<(), InvalidValue> {
    if value.trim().is_empty() {
        return Err(InvalidValue::Empty);
    }
    if value == NOT_PROVIDED || value == INVALID {
        return Err(InvalidValue::Sentinel(value.to_string()));
    }
    if !matches_type(field.field_type, value) {
        return Err(InvalidValue::Format(field.field_type));
    }
    let pattern = field.pattern().map_err(|_| {
        InvalidValue::BadPattern(field.validation_pattern.clone().unwrap_or_default())
    })?;
    if let Some(re) = pattern {
        let anchored = re.find(value).is_some_and(|m| m.start() == 0);
        if !anchored {
            return Err(InvalidValue::PatternMismatch(re.as_str().to_string()));
        }
    }
    Ok(())
}

/// Boolean form of [`validate_value`].
pub fn is_valid_value(field: &FieldDefinition, value: &str) -> bool {
    validate_value(field, value).is_ok()
}

fn matches_type(field_type: FieldType, value: &str) -> bool {
    match field_type {
        FieldType::Email => EMAIL.is_match(value),
        FieldType::Phone => {
            PHONE.is_match(value)
                && value.chars().filter(char::is_ascii_digit).count() >= MIN_PHONE_DIGITS
        }
        FieldType::Url => URL.is_match(value),
        FieldType::Number => value.trim().parse::<f64>().is_ok(),
        FieldType::Text | FieldType::Date => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn field(field_type: FieldType) -> FieldDefinition {
        FieldDefinition::new("f", field_type).unwrap()
    }

    mod sentinels {
        use super::*;

        #[test]
        fn sentinels_and_empty_are_always_invalid() {
            for t in [
                FieldType::Text,
                FieldType::Email,
                FieldType::Phone,
                FieldType::Url,
                FieldType::Number,
                FieldType::Date,
            ] {
                assert_eq!(validate_value(&field(t), ""), Err(InvalidValue::Empty));
                assert_eq!(validate_value(&field(t), "   "), Err(InvalidValue::Empty));
                assert!(matches!(
                    validate_value(&field(t), NOT_PROVIDED),
                    Err(InvalidValue::Sentinel(_))
                ));
                assert!(matches!(
                    validate_value(&field(t), INVALID),
                    Err(InvalidValue::Sentinel(_))
                ));
            }
        }
    }

    mod types {
        use super::*;

        #[test]
        fn email_shapes() {
            let f = field(FieldType::Email);
            assert!(is_valid_value(&f, "x@y.com"));
            assert!(is_valid_value(&f, "first.last+tag@mail.example.org"));
            assert!(!is_valid_value(&f, "not-an-email"));
            assert!(!is_valid_value(&f, "a@b"));
            assert!(!is_valid_value(&f, "a@@b.com"));
            assert!(!is_valid_value(&f, "@b.com"));
            assert!(!is_valid_value(&f, "a@b.c"));
        }

        #[test]
        fn phone_needs_seven_digits_and_allowed_chars() {
            let f = field(FieldType::Phone);
            assert!(is_valid_value(&f, "+1 (555) 123-4567"));
            assert!(is_valid_value(&f, "5551234"));
            assert!(!is_valid_value(&f, "555-123"));
            assert!(!is_valid_value(&f, "555.123.4567"));
            assert!(!is_valid_value(&f, "call me"));
        }

        #[test]
        fn url_requires_http_scheme_and_remainder() {
            let f = field(FieldType::Url);
            assert!(is_valid_value(&f, "https://example.com/path"));
            assert!(is_valid_value(&f, "http://x"));
            assert!(!is_valid_value(&f, "https://"));
            assert!(!is_valid_value(&f, "ftp://example.com"));
            assert!(!is_valid_value(&f, "example.com"));
            assert!(!is_valid_value(&f, "https://exa mple.com"));
        }

        #[test]
        fn number_parses_as_float() {
            let f = field(FieldType::Number);
            assert!(is_valid_value(&f, "42"));
            assert!(is_valid_value(&f, "-3.5"));
            assert!(is_valid_value(&f, "1e3"));
            assert!(!is_valid_value(&f, "forty two"));
        }

        #[test]
        fn text_and_date_accept_anything_non_empty() {
            assert!(is_valid_value(&field(FieldType::Text), "anything at all"));
            assert!(is_valid_value(&field(FieldType::Date), "next Tuesday"));
        }
    }

    mod patterns {
        use super::*;

        #[test]
        fn pattern_applies_on_top_of_type_rule() {
            let f = field(FieldType::Email).with_pattern(r".*@company\.com");
            assert!(is_valid_value(&f, "jane@company.com"));
            assert!(matches!(
                validate_value(&f, "jane@other.com"),
                Err(InvalidValue::PatternMismatch(_))
            ));
            assert!(matches!(
                validate_value(&f, "company.com"),
                Err(InvalidValue::Format(FieldType::Email))
            ));
        }

        #[test]
        fn pattern_is_anchored_at_start_only() {
            let f = field(FieldType::Text).with_pattern(r"[0-9]{5}");
            assert!(is_valid_value(&f, "12345-6789"));
            assert!(!is_valid_value(&f, "zip 12345"));
        }

        #[test]
        fn broken_pattern_rejects_value() {
            let f = field(FieldType::Text).with_pattern("(");
            assert!(matches!(
                validate_value(&f, "abc"),
                Err(InvalidValue::BadPattern(_))
            ));
        }
    }

    proptest! {
        #[test]
        fn accepted_emails_have_one_at_and_dotted_domain(value in "\\PC{0,30}") {
            if is_valid_value(&field(FieldType::Email), &value) {
                prop_assert_eq!(value.matches('@').count(), 1);
                let domain = value.split('@').nth(1).unwrap_or("");
                prop_assert!(!domain.is_empty());
                prop_assert!(domain.contains('.'));
            }
        }

        #[test]
        fn malformed_emails_are_rejected(local in "[a-z]{1,8}", domain in "[a-z]{1,8}") {
            let f = field(FieldType::Email);
            let no_dot = format!("{}@{}", local, domain);
            let two_ats = format!("{}@@{}.com", local, domain);
            let no_at = format!("{}{}.com", local, domain);
            prop_assert!(!is_valid_value(&f, &no_dot));
            prop_assert!(!is_valid_value(&f, &two_ats));
            prop_assert!(!is_valid_value(&f, &no_at));
        }

        #[test]
        fn validation_is_idempotent(value in "\\PC{0,24}", kind in 0usize..6) {
            let types = [
                FieldType::Text,
                FieldType::Email,
                FieldType::Phone,
                FieldType::Url,
                FieldType::Number,
                FieldType::Date,
            ];
            let f = field(types[kind]);
            prop_assert_eq!(validate_value(&f, &value), validate_value(&f, &value));
        }
    }
}
