//! Metrics collection and exposition.
//!
//! # Metrics
//! - `serializer_responses_total` (counter): serialized responses by serializer, wrapped
//! - `serializer_status_rewrites_total` (counter): error statuses folded into a 200
//! - `serializer_errors_total` (counter): fatal serializer errors by kind
//! - `serializer_passthrough_total` (counter): matching responses without a structured body

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_response(serializer: &'static str, wrapped: bool) {
    ::metrics::counter!(
        "serializer_responses_total",
        "serializer" => serializer,
        "wrapped" => if wrapped { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_status_rewrite(status: u16) {
    ::metrics::counter!("serializer_status_rewrites_total", "status" => status.to_string())
        .increment(1);
}

pub fn record_error(kind: &'static str) {
    ::metrics::counter!("serializer_errors_total", "kind" => kind).increment(1);
}

pub fn record_passthrough(serializer: &'static str) {
    ::metrics::counter!("serializer_passthrough_total", "serializer" => serializer).increment(1);
}
