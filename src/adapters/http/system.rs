//! Service endpoints: root, health and Prometheus metrics.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::telemetry::metrics_handler;

use super::state::IntakeAppState;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub agent_configured: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
}

/// GET /health - Liveness plus whether an agent is loaded.
pub async fn health_check(State(state): State<IntakeAppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: VERSION,
        agent_configured: state.agent().await.is_some(),
    })
}

/// GET / - Welcome message.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Welcome to the Intake Agent API",
        version: VERSION,
    })
}

/// Root, health and metrics routes.
pub fn system_routes() -> Router<IntakeAppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
}
