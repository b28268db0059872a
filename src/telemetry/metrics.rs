//! Prometheus metrics.
//!
//! Every metric is registered once, in the default registry, the first time
//! [`metrics`] is called. `GET /metrics` renders the registry as text.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram, register_histogram_vec, CounterVec,
    Encoder, Gauge, Histogram, HistogramVec, TextEncoder,
};

use crate::domain::conversation::ConversationStatus;
use crate::domain::escalation::EscalationOutcome;
use crate::domain::fields::FieldType;
use crate::ports::CompletionPurpose;

/// Covers 1ms to 10s.
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Turns and model calls wait on the network, so these reach 30s.
const TURN_LATENCY_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

static METRICS: Lazy<Result<IntakeMetrics, prometheus::Error>> = Lazy::new(IntakeMetrics::new);

/// The process-wide metrics, or `None` if registration failed.
pub fn metrics() -> Option<&'static IntakeMetrics> {
    match METRICS.as_ref() {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            tracing::warn!(error = %e, "metrics unavailable");
            None
        }
    }
}

/// All intake agent metrics.
#[derive(Clone)]
pub struct IntakeMetrics {
    /// labels: method, endpoint, status
    pub http_requests_total: CounterVec,
    /// labels: method, endpoint
    pub http_request_duration_seconds: HistogramVec,
    /// labels: status (success/error)
    pub messages_processed_total: CounterVec,
    pub message_processing_seconds: Histogram,
    /// labels: operation
    pub llm_calls_total: CounterVec,
    /// labels: operation
    pub llm_call_duration_seconds: HistogramVec,
    /// labels: policy_type, reason
    pub escalations_total: CounterVec,
    /// labels: field_type, result (valid/invalid)
    pub validations_total: CounterVec,
    /// labels: status (terminal status reached)
    pub conversations_total: CounterVec,
    pub conversations_active: Gauge,
}

impl IntakeMetrics {
    /// Creates and registers every metric.
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "intake_http_requests_total",
                "Total HTTP requests",
                &["method", "endpoint", "status"]
            )?,
            http_request_duration_seconds: register_histogram_vec!(
                "intake_http_request_duration_seconds",
                "HTTP request latency in seconds",
                &["method", "endpoint"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )?,
            messages_processed_total: register_counter_vec!(
                "intake_messages_processed_total",
                "User messages processed",
                &["status"]
            )?,
            message_processing_seconds: register_histogram!(
                "intake_message_processing_seconds",
                "Time to process one user message",
                TURN_LATENCY_BUCKETS.to_vec()
            )?,
            llm_calls_total: register_counter_vec!(
                "intake_llm_calls_total",
                "Text capability calls",
                &["operation"]
            )?,
            llm_call_duration_seconds: register_histogram_vec!(
                "intake_llm_call_duration_seconds",
                "Text capability call latency in seconds",
                &["operation"],
                TURN_LATENCY_BUCKETS.to_vec()
            )?,
            escalations_total: register_counter_vec!(
                "intake_escalations_total",
                "Escalations triggered",
                &["policy_type", "reason"]
            )?,
            validations_total: register_counter_vec!(
                "intake_validations_total",
                "Field validations",
                &["field_type", "result"]
            )?,
            conversations_total: register_counter_vec!(
                "intake_conversations_total",
                "Conversations by outcome",
                &["status"]
            )?,
            conversations_active: register_gauge!(
                "intake_conversations_active",
                "Conversations currently accepting turns"
            )?,
        })
    }

    pub fn record_http_request(&self, method: &str, endpoint: &str, status: u16, duration_secs: f64) {
        let status = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, endpoint, &status])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration_secs);
    }

    pub fn record_message(&self, success: bool, duration_secs: f64) {
        let status = if success { "success" } else { "error" };
        self.messages_processed_total.with_label_values(&[status]).inc();
        self.message_processing_seconds.observe(duration_secs);
    }

    pub fn record_llm_call(&self, purpose: CompletionPurpose, duration_secs: f64) {
        let operation = purpose.as_str();
        self.llm_calls_total.with_label_values(&[operation]).inc();
        self.llm_call_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn record_escalation(&self, outcome: &EscalationOutcome) {
        self.escalations_total
            .with_label_values(&[outcome.policy_type().as_str(), outcome.reason()])
            .inc();
    }

    pub fn record_validation(&self, field_type: FieldType, valid: bool) {
        let result = if valid { "valid" } else { "invalid" };
        self.validations_total
            .with_label_values(&[field_type.as_str(), result])
            .inc();
    }

    pub fn conversation_started(&self) {
        self.conversations_active.inc();
    }

    /// Counts a conversation that reached a terminal status.
    pub fn conversation_ended(&self, status: ConversationStatus) {
        self.conversations_total
            .with_label_values(&[status.as_str()])
            .inc();
        self.conversations_active.dec();
    }

    /// Drops an active conversation from the gauge without counting an outcome.
    pub fn conversation_discarded(&self) {
        self.conversations_active.dec();
    }
}

/// Handler for `GET /metrics`. Renders the default registry as text.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::escalation::PolicyType;

    fn rendered() -> String {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn metrics_register_once() {
        assert!(metrics().is_some());
        assert!(std::ptr::eq(metrics().unwrap(), metrics().unwrap()));
    }

    #[test]
    fn escalation_is_labelled_by_policy_type_and_reason() {
        let m = metrics().unwrap();
        let outcome = EscalationOutcome::certain("p1", PolicyType::Keyword, "asked for human");
        let before = m
            .escalations_total
            .with_label_values(&["keyword", "asked for human"])
            .get();

        m.record_escalation(&outcome);

        let after = m
            .escalations_total
            .with_label_values(&["keyword", "asked for human"])
            .get();
        assert_eq!(after - before, 1.0);
    }

    #[test]
    fn validation_result_labels() {
        let m = metrics().unwrap();
        let before = m.validations_total.with_label_values(&["email", "invalid"]).get();
        m.record_validation(FieldType::Email, false);
        assert_eq!(
            m.validations_total.with_label_values(&["email", "invalid"]).get() - before,
            1.0
        );
    }

    #[test]
    fn rendered_output_uses_intake_prefix() {
        let m = metrics().unwrap();
        m.record_llm_call(CompletionPurpose::Extraction, 0.2);
        m.record_http_request("GET", "/health", 200, 0.001);

        let text = rendered();
        assert!(text.contains("intake_llm_calls_total"));
        assert!(text.contains("intake_http_requests_total"));
    }

    #[tokio::test]
    async fn metrics_handler_returns_text() {
        metrics().unwrap().record_message(true, 0.3);
        let response = metrics_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
