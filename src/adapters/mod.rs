//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Text capability providers (OpenAI-compatible, mock, metered)
//! - `storage` - Conversation record stores
//! - `http` - REST and WebSocket API on axum

pub mod ai;
pub mod http;
pub mod storage;

pub use ai::{MeteredAIProvider, MockAIProvider, OpenAIConfig, OpenAIProvider};
pub use http::{create_router, IntakeAppState};
pub use storage::InMemoryConversationStore;
