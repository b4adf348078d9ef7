//! Metrics collection and exposition.
//!
//! # Metrics
//! - `docuserv_requests_total` (counter): requests by method, status
//! - `docuserv_request_duration_seconds` (histogram): request latency
//! - `docuserv_transfers_total` (counter): transfers by direction, outcome
//! - `docuserv_transfer_bytes_total` (counter): bytes moved by direction
//! - `docuserv_transfer_duration_seconds` (histogram): transfer latency
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!(
        "docuserv_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "docuserv_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_transfer(direction: &'static str, outcome: &'static str, bytes: u64, start: Instant) {
    metrics::counter!("docuserv_transfers_total", "direction" => direction, "outcome" => outcome).increment(1);
    metrics::counter!("docuserv_transfer_bytes_total", "direction" => direction).increment(bytes);
    metrics::histogram!("docuserv_transfer_duration_seconds", "direction" => direction)
        .record(start.elapsed().as_secs_f64());
}
