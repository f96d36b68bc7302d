//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, source
//! - `proxy_request_duration_seconds` (histogram): latency by source
//! - `proxy_cache_lookups_total` (counter): hits and misses
//! - `proxy_cache_entries` (gauge): stored responses
//! - `proxy_links_rewritten_total` (counter): links rewritten in HTML, by kind
//! - `proxy_upstream_errors_total` (counter): failures by kind
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::rewrite::LinkKind;

/// Where a response body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Upstream,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Cache => "cache",
            ResponseSource::Upstream => "upstream",
        }
    }
}

/// Install the Prometheus exporter with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &Method, status: u16, source: ResponseSource, start: Instant) {
    ::metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "source" => source.as_str()
    )
    .increment(1);
    ::metrics::histogram!("proxy_request_duration_seconds", "source" => source.as_str())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    ::metrics::counter!("proxy_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_size(entries: usize) {
    ::metrics::gauge!("proxy_cache_entries").set(entries as f64);
}

pub fn record_link_rewritten(kind: LinkKind) {
    ::metrics::counter!("proxy_links_rewritten_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_upstream_error(kind: &'static str) {
    ::metrics::counter!("proxy_upstream_errors_total", "kind" => kind).increment(1);
}
