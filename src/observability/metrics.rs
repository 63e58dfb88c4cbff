//! Metrics collection and exposition.
//!
//! # Metrics
//! - `forward_proxy_requests_total` (counter): finished requests by outcome
//! - `forward_proxy_retries_total` (counter): retries scheduled
//! - `forward_proxy_in_flight` (gauge): admission slots currently held
//! - `forward_proxy_request_duration_seconds` (histogram): end-to-end latency including retries
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished request.
pub fn record_request(outcome: &'static str, start: Instant) {
    metrics::counter!("forward_proxy_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("forward_proxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_retry() {
    metrics::counter!("forward_proxy_retries_total").increment(1);
}

pub fn record_in_flight(count: usize) {
    metrics::gauge!("forward_proxy_in_flight").set(count as f64);
}
