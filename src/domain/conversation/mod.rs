//! Conversation module - the record a turn reads and mutates.
//!
//! - `status` - lifecycle status and its one-way transitions
//! - `message` - message history entries
//! - `record` - the `ConversationRecord` aggregate and per-field values

mod message;
mod record;
mod status;

pub use message::{Message, MessageRole};
pub use record::{ConversationRecord, EscalationInfo, FieldValue};
pub use status::ConversationStatus;
