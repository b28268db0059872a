//! Axum routes for conversation endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::adapters::http::state::IntakeAppState;

use super::handlers::{delete_conversation, get_conversation, send_message, start_conversation};
use super::ws_handler::{conversation_ws_handler, new_conversation_ws_handler};

/// Creates routes for conversation endpoints.
///
/// REST Endpoints:
/// - POST /conversations - Start a conversation
/// - POST /conversations/:session_id/messages - Send a user message
/// - GET /conversations/:session_id - Conversation snapshot
/// - DELETE /conversations/:session_id - Delete a conversation
///
/// WebSocket Endpoints:
/// - WS /ws - New conversation
/// - WS /ws/:session_id - Continue a conversation
pub fn conversation_routes() -> Router<IntakeAppState> {
    Router::new()
        .route("/conversations", post(start_conversation))
        .route("/conversations/:session_id/messages", post(send_message))
        .route(
            "/conversations/:session_id",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/ws", get(new_conversation_ws_handler))
        .route("/ws/:session_id", get(conversation_ws_handler))
}
