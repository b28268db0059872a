//! HTTP and WebSocket adapter for conversation endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;
pub mod ws_handler;
pub mod ws_messages;

pub use dto::{ConversationResponse, MessageRequest, MessageResponse, StartConversationResponse};
pub use routes::conversation_routes;
pub use ws_messages::{ClientMessage, ServerMessage};
