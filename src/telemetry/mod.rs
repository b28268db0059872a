//! Telemetry - Prometheus metrics for the agent and its HTTP surface.

pub mod metrics;
pub mod middleware;

pub use metrics::{metrics, metrics_handler, IntakeMetrics};
pub use middleware::metrics_middleware;
