//! Capability calls - one prompt out, one sanitized reply back.
//!
//! Every step that consults the text capability goes through [`ask`], so
//! each reply is sanitized the same way before any parsing happens. A failed
//! call comes back as a [`CapabilityError`]; callers decide the safe default.

use thiserror::Error;
use tracing::debug;

use crate::domain::foundation::SessionId;
use crate::ports::{AIError, AIProvider, CompletionPurpose, CompletionRequest, RequestMetadata};

/// Maximum accepted reply length in bytes.
pub const MAX_REPLY_LENGTH: usize = 100_000;

const INJECTION_MARKERS: [&str; 11] = [
    "```system",
    "```assistant",
    "[INST]",
    "[/INST]",
    "<|system|>",
    "<|assistant|>",
    "<|user|>",
    "<|im_start|>",
    "<|im_end|>",
    "<<SYS>>",
    "<</SYS>>",
];

/// Errors raised while sanitizing a reply.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SanitizationError {
    #[error("reply too long: {actual} bytes exceeds maximum of {max} bytes")]
    TooLong { max: usize, actual: usize },
}

/// A capability call that produced no usable reply.
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    #[error("provider call failed: {0}")]
    Provider(#[from] AIError),

    #[error("reply rejected: {0}")]
    Sanitization(#[from] SanitizationError),
}

/// Cleans capability replies before they are parsed or shown to the user.
#[derive(Debug, Clone, Default)]
pub struct ReplySanitizer {
    extra_markers: Vec<String>,
}

impl ReplySanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds markers to strip on top of the built-in set.
    pub fn with_extra_markers(mut self, markers: Vec<String>) -> Self {
        self.extra_markers = markers;
        self
    }

    /// Rejects oversized replies, drops control characters other than
    /// `\n`, `\t` and `\r`, strips injection markers, then trims.
    pub fn sanitize(&self, reply: &str) -> Result<String, SanitizationError> {
        if reply.len() > MAX_REPLY_LENGTH {
            return Err(SanitizationError::TooLong {
                max: MAX_REPLY_LENGTH,
                actual: reply.len(),
            });
        }

        let mut cleaned: String = reply
            .chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
            .collect();

        for marker in INJECTION_MARKERS {
            cleaned = cleaned.replace(marker, "");
        }
        for marker in &self.extra_markers {
            cleaned = cleaned.replace(marker.as_str(), "");
        }

        Ok(cleaned.trim().to_string())
    }
}

/// Sends one prompt and returns the sanitized reply.
pub async fn ask(
    ai: &dyn AIProvider,
    session_id: SessionId,
    purpose: CompletionPurpose,
    prompt: String,
) -> Result<String, CapabilityError> {
    let metadata = RequestMetadata::new(session_id, purpose);
    debug!(
        session_id = %session_id,
        purpose = %purpose,
        trace_id = %metadata.trace_id,
        "capability call"
    );
    let response = ai.complete(CompletionRequest::new(prompt, metadata)).await?;
    Ok(ReplySanitizer::new().sanitize(&response.content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};

    mod sanitizer {
        use super::*;

        #[test]
        fn keeps_plain_text_and_trims() {
            let out = ReplySanitizer::new().sanitize("  Jane Doe\n").unwrap();
            assert_eq!(out, "Jane Doe");
        }

        #[test]
        fn removes_control_characters_but_keeps_newlines() {
            let out = ReplySanitizer::new()
                .sanitize("DETECTED: NONE\u{0007}\nCONFIDENCE: 0.0")
                .unwrap();
            assert_eq!(out, "DETECTED: NONE\nCONFIDENCE: 0.0");
        }

        #[test]
        fn strips_injection_markers() {
            let out = ReplySanitizer::new()
                .sanitize("<|im_start|>x@y.com<|im_end|>")
                .unwrap();
            assert_eq!(out, "x@y.com");
        }

        #[test]
        fn strips_extra_markers() {
            let out = ReplySanitizer::new()
                .with_extra_markers(vec!["###".to_string()])
                .sanitize("### hello")
                .unwrap();
            assert_eq!(out, "hello");
        }

        #[test]
        fn rejects_oversized_reply() {
            let huge = "a".repeat(MAX_REPLY_LENGTH + 1);
            assert!(matches!(
                ReplySanitizer::new().sanitize(&huge),
                Err(SanitizationError::TooLong { .. })
            ));
        }
    }

    mod calls {
        use super::*;

        #[tokio::test]
        async fn ask_returns_sanitized_content_and_tags_purpose() {
            let ai = MockAIProvider::new().with_response("  [INST]ON_TOPIC ");
            let session = SessionId::new();

            let reply = ask(&ai, session, CompletionPurpose::OffTopicCheck, "p".into())
                .await
                .unwrap();

            assert_eq!(reply, "ON_TOPIC");
            let calls = ai.get_calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].metadata.purpose, CompletionPurpose::OffTopicCheck);
            assert_eq!(calls[0].metadata.session_id, session);
        }

        #[tokio::test]
        async fn ask_surfaces_provider_errors() {
            let ai = MockAIProvider::new().with_error(MockError::Unavailable {
                message: "down".into(),
            });
            let result = ask(&ai, SessionId::new(), CompletionPurpose::Extraction, "p".into()).await;
            assert!(matches!(result, Err(CapabilityError::Provider(_))));
        }
    }
}
