//! Agent module - the configuration a conversation is driven by.

mod definition;
mod personality;

pub use definition::{AgentDefinition, AgentDefinitionError, DEFAULT_GREETING};
pub use personality::{Formality, Personality, Tone};
