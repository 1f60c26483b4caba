//! Prometheus metrics for prediction latency and request outcomes.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Prediction latency metric name.
pub const METRIC_PREDICTION_LATENCY: &str = "prediction_latency_ms";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Predictions served counter metric name.
pub const METRIC_PREDICTIONS: &str = "predictions_total";
/// Baseline fallbacks counter metric name.
pub const METRIC_UNKNOWN_LOCATIONS: &str = "unknown_locations_total";
/// Rejected requests counter metric name.
pub const METRIC_REJECTED_REQUESTS: &str = "rejected_requests_total";
/// Artifact loads counter metric name.
pub const METRIC_ARTIFACT_LOADS: &str = "artifact_loads_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_PREDICTION_LATENCY,
        "Feature encoding plus model prediction latency in milliseconds"
    );
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );

    describe_counter!(METRIC_PREDICTIONS, "Total number of price estimates served");
    describe_counter!(
        METRIC_UNKNOWN_LOCATIONS,
        "Total number of estimates that fell back to the baseline location"
    );
    describe_counter!(
        METRIC_REJECTED_REQUESTS,
        "Total number of prediction requests rejected"
    );
    describe_counter!(
        METRIC_ARTIFACT_LOADS,
        "Total number of successful artifact loads"
    );

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &'static str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint).record(latency_ms);
}

/// Increment predictions counter.
pub fn inc_predictions() {
    counter!(METRIC_PREDICTIONS).increment(1);
}

/// Increment baseline fallback counter.
pub fn inc_unknown_locations() {
    counter!(METRIC_UNKNOWN_LOCATIONS).increment(1);
}

/// Increment rejected requests counter.
pub fn inc_rejected_requests(reason: &'static str) {
    counter!(METRIC_REJECTED_REQUESTS, "reason" => reason).increment(1);
}

/// Increment artifact loads counter.
pub fn inc_artifact_loads() {
    counter!(METRIC_ARTIFACT_LOADS).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for a prediction.
pub fn timer_prediction() -> LatencyTimer {
    LatencyTimer::new(METRIC_PREDICTION_LATENCY)
}
