//! Metered AI Provider - Wrapper that records every capability call.
//!
//! Counts calls and their latency per completion purpose, whatever the
//! wrapped provider returns.
//!
//! # Example
//!
//! ```ignore
//! let provider = MeteredAIProvider::new(OpenAIProvider::new(config));
//! ```

use async_trait::async_trait;
use std::time::Instant;

use crate::ports::{AIError, AIProvider, CompletionRequest, CompletionResponse, ProviderInfo};
use crate::telemetry::metrics;

/// AI provider wrapper feeding `intake_llm_calls_total` and
/// `intake_llm_call_duration_seconds`.
pub struct MeteredAIProvider<P: AIProvider> {
    inner: P,
}

impl<P: AIProvider> MeteredAIProvider<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: AIProvider> AIProvider for MeteredAIProvider<P> {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let purpose = request.metadata.purpose;
        let started = Instant::now();
        let result = self.inner.complete(request).await;
        if let Some(m) = metrics() {
            m.record_llm_call(purpose, started.elapsed().as_secs_f64());
        }
        result
    }

    fn provider_info(&self) -> ProviderInfo {
        self.inner.provider_info()
    }
}
