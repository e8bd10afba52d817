//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rproxy_requests_total` (counter): proxied requests by method, status
//! - `rproxy_request_duration_seconds` (histogram): latency distribution
//! - `rproxy_dial_failures_total` (counter): failed upstream dials
//! - `rproxy_upstream_healthy` (gauge): 1=healthy, 0=disabled
//! - `rproxy_probe_attempts_total` (counter): failed reconnection probes
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with an HTTP scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "rproxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("rproxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_dial_failure(upstream: &str) {
    metrics::counter!("rproxy_dial_failures_total", "upstream" => upstream.to_string()).increment(1);
}

pub fn record_upstream_health(host: &str, upstream: &str, healthy: bool) {
    metrics::gauge!(
        "rproxy_upstream_healthy",
        "host" => host.to_string(),
        "upstream" => upstream.to_string()
    )
    .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_probe_attempt(upstream: &str) {
    metrics::counter!("rproxy_probe_attempts_total", "upstream" => upstream.to_string()).increment(1);
}
