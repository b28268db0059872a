//! Axum middleware recording request count and latency.

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;

use super::metrics::metrics;

/// Label for requests that matched no route.
const UNMATCHED: &str = "unmatched";

/// Records `intake_http_requests_total` and
/// `intake_http_request_duration_seconds`.
///
/// The endpoint label is the route template (`/conversations/:session_id`),
/// never the raw path, so session ids do not become label values.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED.to_string());

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();
    if let Some(m) = metrics() {
        m.record_http_request(method.as_str(), &endpoint, status.as_u16(), duration.as_secs_f64());
    }
    tracing::debug!(
        method = %method,
        endpoint = %endpoint,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}
