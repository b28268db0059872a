//! Intake conversation command and query handlers.

mod delete_conversation;
mod get_conversation;
mod process_turn;
mod session_locks;
mod start_conversation;

pub use delete_conversation::{
    DeleteConversationCommand, DeleteConversationError, DeleteConversationHandler,
};
pub use get_conversation::{
    ConversationView, GetConversationError, GetConversationHandler, GetConversationQuery,
};
pub use process_turn::{ProcessTurnCommand, ProcessTurnError, ProcessTurnHandler, ProcessTurnResult};
pub use session_locks::SessionLocks;
pub use start_conversation::{
    StartConversationCommand, StartConversationError, StartConversationHandler,
    StartConversationResult,
};
