//! Mock AI Provider for testing.
//!
//! Provides a scriptable implementation of the AIProvider port so turns can
//! run without calling a real model.
//!
//! # Features
//!
//! - Responses queued per completion purpose, plus a shared fallback queue
//! - Error injection for resilience testing
//! - Call tracking for verification
//!
//! Once every matching queue is empty the provider reports itself
//! unavailable, which exercises the turn's safe defaults.
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response_for(CompletionPurpose::Extraction, "Jane Doe")
//!     .with_error(MockError::Unavailable { message: "down".into() });
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionPurpose, CompletionRequest, CompletionResponse, FinishReason,
    ProviderInfo, TokenUsage,
};

/// Mock AI provider for testing.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Responses for any purpose, consumed in order.
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Responses reserved for one purpose; consulted first.
    by_purpose: Arc<Mutex<HashMap<CompletionPurpose, VecDeque<MockResponse>>>>,
    info: ProviderInfo,
    delay: Duration,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success {
        content: String,
        usage: TokenUsage,
        finish_reason: FinishReason,
    },
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    ContentFiltered { reason: String },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::ContentFiltered { reason } => AIError::content_filtered(reason),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn success(content: impl Into<String>) -> MockResponse {
    MockResponse::Success {
        content: content.into(),
        usage: TokenUsage::new(10, 20),
        finish_reason: FinishReason::Stop,
    }
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    /// Creates a provider with empty queues.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            by_purpose: Arc::new(Mutex::new(HashMap::new())),
            info: ProviderInfo::new("mock", "mock-model-1", 128_000),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a successful response for any purpose.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        lock(&self.responses).push_back(success(content));
        self
    }

    /// Queues an error for any purpose.
    pub fn with_error(self, error: MockError) -> Self {
        lock(&self.responses).push_back(MockResponse::Error(error));
        self
    }

    /// Queues a successful response for one purpose.
    pub fn with_response_for(self, purpose: CompletionPurpose, content: impl Into<String>) -> Self {
        self.push_for(purpose, success(content))
    }

    /// Queues an error for one purpose.
    pub fn with_error_for(self, purpose: CompletionPurpose, error: MockError) -> Self {
        self.push_for(purpose, MockResponse::Error(error))
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        lock(&self.calls).clone()
    }

    /// Returns the recorded calls made for one purpose.
    pub fn calls_for(&self, purpose: CompletionPurpose) -> Vec<CompletionRequest> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.metadata.purpose == purpose)
            .cloned()
            .collect()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn push_for(self, purpose: CompletionPurpose, response: MockResponse) -> Self {
        lock(&self.by_purpose)
            .entry(purpose)
            .or_default()
            .push_back(response);
        self
    }

    fn next_response(&self, purpose: CompletionPurpose) -> Option<MockResponse> {
        let scripted = lock(&self.by_purpose)
            .get_mut(&purpose)
            .and_then(VecDeque::pop_front);
        scripted.or_else(|| lock(&self.responses).pop_front())
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let purpose = request.metadata.purpose;
        lock(&self.calls).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response(purpose) {
            Some(MockResponse::Success {
                content,
                usage,
                finish_reason,
            }) => Ok(CompletionResponse {
                content,
                usage,
                model: self.info.model.clone(),
                finish_reason,
            }),
            Some(MockResponse::Error(err)) => Err(err.into()),
            None => Err(AIError::unavailable(format!(
                "no scripted response for {}",
                purpose
            ))),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
