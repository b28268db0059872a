//! API error type shared by every HTTP handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::application::handlers::intake::{
    DeleteConversationError, GetConversationError, ProcessTurnError, StartConversationError,
};
use crate::domain::turn::TurnError;

/// Error body: a short message plus optional detail.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// API errors mapped onto HTTP status codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    BadRequest(String),
    /// Resource kind and identifier.
    NotFound(String, String),
    Conflict(String),
    /// No agent definition is loaded.
    AgentNotConfigured,
    Internal(String),
}

impl ApiError {
    pub fn conversation_not_found(session_id: impl ToString) -> Self {
        ApiError::NotFound("Conversation".to_string(), session_id.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(..) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::AgentNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(msg) => ErrorResponse::new("Bad request").with_detail(msg),
            ApiError::NotFound(resource, id) => {
                ErrorResponse::new("Not found").with_detail(format!("{} '{}' not found.", resource, id))
            }
            ApiError::Conflict(msg) => ErrorResponse::new("Conflict").with_detail(msg),
            ApiError::AgentNotConfigured => ErrorResponse::new("Service unavailable")
                .with_detail("Agent not configured. Please configure the agent first."),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ErrorResponse::new("Internal error").with_detail(msg)
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<StartConversationError> for ApiError {
    fn from(err: StartConversationError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<ProcessTurnError> for ApiError {
    fn from(err: ProcessTurnError) -> Self {
        match err {
            ProcessTurnError::NotFound(id) => ApiError::conversation_not_found(id),
            ProcessTurnError::Turn(TurnError::EmptyUtterance) => {
                ApiError::BadRequest("Message content cannot be empty.".to_string())
            }
            ProcessTurnError::Turn(TurnError::ConversationClosed(status)) => {
                ApiError::Conflict(format!("Conversation is {} and accepts no more messages.", status))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<GetConversationError> for ApiError {
    fn from(err: GetConversationError) -> Self {
        match err {
            GetConversationError::NotFound(id) => ApiError::conversation_not_found(id),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<DeleteConversationError> for ApiError {
    fn from(err: DeleteConversationError) -> Self {
        match err {
            DeleteConversationError::NotFound(id) => ApiError::conversation_not_found(id),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
