//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer coordinates the turn machine with the conversation store.

pub mod handlers;

pub use handlers::{
    ConversationView, DeleteConversationCommand, DeleteConversationError, DeleteConversationHandler, GetConversationError, GetConversationHandler, GetConversationQuery,
    ProcessTurnCommand, ProcessTurnError, ProcessTurnHandler, ProcessTurnResult, SessionLocks,
    StartConversationCommand, StartConversationError, StartConversationHandler,
    StartConversationResult,
};
