//! Metrics collection and exposition.
//!
//! # Metrics
//! - `access_filter_decisions_total` (counter): decisions by `outcome` and `reason`
//! - `access_filter_reloads_total` (counter): policy reloads by `result`
//! - `access_gateway_rejected_messages_total` (counter): malformed requests by `kind`
//! - `access_gateway_upstream_errors_total` (counter): failed forwards

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::filter::FilterResult;

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one filter decision.
pub fn record_decision(result: &FilterResult) {
    let (outcome, reason) = match result.reason() {
        None => ("allowed", "none"),
        Some(reason) => ("denied", reason.as_str()),
    };
    metrics::counter!(
        "access_filter_decisions_total",
        "outcome" => outcome,
        "reason" => reason
    )
    .increment(1);
}

/// Count one policy reload attempt.
pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("access_filter_reloads_total", "result" => result).increment(1);
}

/// Count a request rejected before filtering (`parse_error`, `invalid_request`, `too_large`).
pub fn record_rejected_message(kind: &'static str) {
    metrics::counter!("access_gateway_rejected_messages_total", "kind" => kind).increment(1);
}

pub fn record_upstream_error() {
    metrics::counter!("access_gateway_upstream_errors_total").increment(1);
}
