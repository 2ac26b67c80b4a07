//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, latency, upstream failures)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, registry
//! - `proxy_request_duration_seconds` (histogram): time to response head
//! - `proxy_upstream_failures_total` (counter): transport failures by registry, kind
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels for method, registry, status code

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, registry: &str, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "registry" => registry.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "registry" => registry.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record an upstream transport failure.
pub fn record_upstream_failure(registry: &str, kind: &'static str) {
    metrics::counter!(
        "proxy_upstream_failures_total",
        "registry" => registry.to_string(),
        "kind" => kind
    )
    .increment(1);
}
