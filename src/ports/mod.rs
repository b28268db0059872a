//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - The text capability used for extraction, classification
//!   and reply generation
//! - `ConversationStore` - Persistence of conversation records between turns

mod ai_provider;
mod conversation_store;

pub use ai_provider::{
    AIError, AIProvider, CompletionPurpose, CompletionRequest, CompletionResponse, FinishReason,
    ProviderInfo, RequestMetadata, TokenUsage,
};
pub use conversation_store::{ConversationStore, ListFilter, StoreError};
