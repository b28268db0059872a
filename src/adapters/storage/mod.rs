//! Storage Adapters
//!
//! Implementations of the ConversationStore port.
//!
//! ## Available Adapters
//!
//! - **InMemoryConversationStore** - Keeps records in memory (testing/development)

mod in_memory_conversation_store;

pub use in_memory_conversation_store::InMemoryConversationStore;
