//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by outcome (hit, miss, rejected)
//! - `proxy_upstream_errors_total` (counter): failed forwards by kind
//! - `proxy_cache_store_total` (counter): responses written to the cache
//! - `proxy_upstream_in_flight` (gauge): connections waiting on an origin
//! - `proxy_response_bytes_total` (counter): bytes replied to clients
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Outcome of one client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Hit,
    Miss,
    Rejected,
}

impl RequestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestOutcome::Hit => "hit",
            RequestOutcome::Miss => "miss",
            RequestOutcome::Rejected => "rejected",
        }
    }
}

pub fn record_request(outcome: RequestOutcome) {
    metrics::counter!("proxy_requests_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_upstream_error(kind: &'static str) {
    metrics::counter!("proxy_upstream_errors_total", "kind" => kind).increment(1);
}

pub fn record_cache_store() {
    metrics::counter!("proxy_cache_store_total").increment(1);
}

pub fn record_response_bytes(bytes: usize) {
    metrics::counter!("proxy_response_bytes_total").increment(bytes as u64);
}

pub fn record_upstream_in_flight(in_flight: usize) {
    metrics::gauge!("proxy_upstream_in_flight").set(in_flight as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_store_and_in_flight_names_render() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_cache_store();
            record_upstream_in_flight(2);
            record_request(RequestOutcome::Hit);
        });

        let rendered = handle.render();
        assert!(rendered.contains("proxy_cache_store_total 1"), "{}", rendered);
        assert!(rendered.contains("proxy_upstream_in_flight 2"), "{}", rendered);
        assert!(rendered.contains("proxy_requests_total{outcome=\"hit\"} 1"), "{}", rendered);
    }
}
