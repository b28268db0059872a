//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port.
//!
//! ## Available Adapters
//!
//! - `MockAIProvider` - Scriptable mock for testing
//! - `OpenAIProvider` - OpenAI-compatible chat completions API
//! - `MeteredAIProvider` - Wrapper recording call counts and latency

mod metered_provider;
mod mock_provider;
mod openai_provider;

pub use metered_provider::MeteredAIProvider;
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
