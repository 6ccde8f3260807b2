//! Metrics collection.
//!
//! # Metrics
//! - `connector_exchanges_total` (counter): exchanges with headers, by method, status
//! - `connector_connect_failures_total` (counter): failed exchanges, by reason
//! - `connector_time_to_headers_seconds` (histogram): dispatch latency
//! - `connector_body_chunks_total` (counter): chunks handed to consumers
//! - `connector_body_bytes_total` (counter): bytes handed to consumers
//! - `connector_body_outcomes_total` (counter): completed / failed / cancelled
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; exporting is up to the host
//!   application, and without a recorder every call is a no-op

use metrics::{counter, histogram};
use std::time::Instant;

/// Record an exchange whose headers arrived.
pub fn record_exchange(method: &str, status: u16, start: Instant) {
    counter!(
        "connector_exchanges_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("connector_time_to_headers_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record an exchange rejected or failed before headers.
pub fn record_connect_failure(reason: &'static str) {
    counter!("connector_connect_failures_total", "reason" => reason).increment(1);
}

/// Record one body chunk delivered downstream.
pub fn record_body_chunk(len: usize) {
    counter!("connector_body_chunks_total").increment(1);
    counter!("connector_body_bytes_total").increment(len as u64);
}

/// Record how a body stream ended.
pub fn record_body_outcome(outcome: &'static str) {
    counter!("connector_body_outcomes_total", "outcome" => outcome).increment(1);
}
