//! HTTP adapters - REST and WebSocket API.
//!
//! - `conversation` - start, message, get, delete and the WebSocket channel
//! - `agent_config` - inspect and reload the agent definition
//! - `system` - root, health and Prometheus metrics

pub mod agent_config;
pub mod conversation;
pub mod error;
pub mod state;
pub mod system;

pub use error::{ApiError, ErrorResponse};
pub use state::IntakeAppState;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::telemetry::metrics_middleware;

/// Every route, without server-level layers.
pub fn api_routes() -> Router<IntakeAppState> {
    Router::new()
        .merge(system::system_routes())
        .merge(agent_config::agent_config_routes())
        .merge(conversation::conversation_routes())
        .route_layer(axum::middleware::from_fn(metrics_middleware))
}

/// The application router with tracing, CORS and timeout layers.
pub fn create_router(state: IntakeAppState, config: &ServerConfig) -> Router {
    api_routes()
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&config.cors_origins_list()))
        .with_state(state)
}

/// Any origin when none are configured; otherwise only the listed ones.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    tracing::info!("CORS configured with {} origins", parsed.len());
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}
