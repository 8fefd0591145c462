//! Prometheus Metrics Module
//!
//! Exposes application metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Messages**: Counts of batches and data points received
//! - **Decoding**: Decode failure counts
//! - **Connection**: Reconnection attempts and watched symbols
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "tickfeed_batches_received_total",
        "Total decoded batches received from the feed"
    );
    describe_counter!(
        "tickfeed_points_received_total",
        "Total data points received from the feed"
    );
    describe_counter!(
        "tickfeed_decode_failures_total",
        "Total feed messages dropped because they failed to decode"
    );
    describe_counter!(
        "tickfeed_reconnects_total",
        "Total WebSocket reconnection attempts"
    );
    describe_gauge!(
        "tickfeed_watched_symbols",
        "Number of symbols currently in the watch set"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record one decoded batch and the points it carried.
pub fn record_batch_received(points: u64) {
    counter!("tickfeed_batches_received_total").increment(1);
    counter!("tickfeed_points_received_total").increment(points);
}

/// Record a feed message dropped at decode.
pub fn record_decode_failure() {
    counter!("tickfeed_decode_failures_total").increment(1);
}

/// Record a WebSocket reconnection attempt.
pub fn record_reconnect() {
    counter!("tickfeed_reconnects_total").increment(1);
}

/// Update the watched symbol count.
pub fn set_watched_symbols(count: f64) {
    gauge!("tickfeed_watched_symbols").set(count);
}
