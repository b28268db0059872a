//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod intake;

pub use intake::{
    ConversationView, DeleteConversationCommand, DeleteConversationError, DeleteConversationHandler, GetConversationError, GetConversationHandler, GetConversationQuery,
    ProcessTurnCommand, ProcessTurnError, ProcessTurnHandler, ProcessTurnResult, SessionLocks,
    StartConversationCommand, StartConversationError, StartConversationHandler,
    StartConversationResult,
};
