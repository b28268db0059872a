//! HTTP handlers for conversation endpoints.
//!
//! These handlers connect Axum routes to the intake command and query handlers.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::state::IntakeAppState;
use crate::application::handlers::intake::{
    DeleteConversationCommand, GetConversationQuery, ProcessTurnCommand, StartConversationCommand,
};
use crate::domain::foundation::SessionId;

use super::dto::{
    ConversationResponse, DeleteConversationResponse, MessageRequest, MessageResponse,
    StartConversationResponse,
};

pub(crate) fn parse_session_id(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid session ID format".to_string()))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /conversations
// ════════════════════════════════════════════════════════════════════════════════

/// POST /conversations - Start a conversation and return the greeting.
///
/// # Errors
/// - 503 Service Unavailable: No agent definition is loaded
pub async fn start_conversation(
    State(state): State<IntakeAppState>,
) -> Result<impl IntoResponse, ApiError> {
    let context = state.require_agent().await?;
    let result = state
        .start_handler(context)
        .handle(StartConversationCommand::default())
        .await?;

    Ok((StatusCode::OK, Json(StartConversationResponse::from(result))))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /conversations/:session_id/messages
// ════════════════════════════════════════════════════════════════════════════════

/// POST /conversations/:session_id/messages - Process one user message.
///
/// # Errors
/// - 400 Bad Request: Malformed session id or empty content
/// - 404 Not Found: Unknown session
/// - 409 Conflict: Conversation already ended
/// - 500 Internal Server Error: The turn failed; the conversation is now failed
/// - 503 Service Unavailable: No agent definition is loaded
pub async fn send_message(
    State(state): State<IntakeAppState>,
    Path(session_id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    let context = state.require_agent().await?;

    let result = state
        .turn_handler(context)
        .handle(ProcessTurnCommand {
            session_id,
            utterance: request.content,
        })
        .await?;

    Ok((StatusCode::OK, Json(MessageResponse::from(result))))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /conversations/:session_id
// ════════════════════════════════════════════════════════════════════════════════

/// GET /conversations/:session_id - Full conversation snapshot.
///
/// # Errors
/// - 404 Not Found: Unknown session
pub async fn get_conversation(
    State(state): State<IntakeAppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    let view = state
        .get_handler()
        .handle(GetConversationQuery { session_id })
        .await?;

    Ok((StatusCode::OK, Json(ConversationResponse::from(view))))
}

// ════════════════════════════════════════════════════════════════════════════════
// DELETE /conversations/:session_id
// ════════════════════════════════════════════════════════════════════════════════

/// DELETE /conversations/:session_id - Remove a conversation.
///
/// # Errors
/// - 404 Not Found: Unknown session
pub async fn delete_conversation(
    State(state): State<IntakeAppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    state
        .delete_handler()
        .handle(DeleteConversationCommand { session_id })
        .await?;

    Ok((
        StatusCode::OK,
        Json(DeleteConversationResponse {
            message: format!("Conversation '{}' deleted successfully.", session_id),
        }),
    ))
}
