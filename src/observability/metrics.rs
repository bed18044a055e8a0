//! Metrics collection and exposition.
//!
//! # Metrics
//! - `curation_http_requests_total` (counter): requests by method, status
//! - `curation_access_denied_total` (counter): rejections by reason
//! - `curation_recommendation_duration_seconds` (histogram): query latency
//! - `curation_recommendation_results` (histogram): playlists per answer
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16) {
    ::metrics::counter!(
        "curation_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_access_denied(reason: &'static str) {
    ::metrics::counter!("curation_access_denied_total", "reason" => reason).increment(1);
}

pub fn record_recommendation(start: Instant, result_count: usize) {
    ::metrics::histogram!("curation_recommendation_duration_seconds")
        .record(start.elapsed().as_secs_f64());
    ::metrics::histogram!("curation_recommendation_results").record(result_count as f64);
}
