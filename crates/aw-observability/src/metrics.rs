//! Metrics collection for the Aware platform.
//!
//! Counters are recorded through the `metrics` facade and exported in
//! Prometheus text format by the API's `/metrics` route.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::Once;

pub const BATCHES_CREATED: &str = "aware_batches_created_total";
pub const BATCH_TRANSITIONS: &str = "aware_batch_transitions_total";
pub const SUBMISSIONS_SAVED: &str = "aware_submissions_saved_total";
pub const TEXT_GENERATION_REQUESTS: &str = "aware_text_generation_requests_total";
pub const HTTP_REQUESTS: &str = "aware_http_requests_total";
pub const HTTP_REQUEST_DURATION: &str = "aware_http_request_duration_seconds";

static DESCRIBE: Once = Once::new();

/// Installs the global Prometheus recorder and returns its render handle.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    Ok(handle)
}

/// Registers metric descriptions with the current recorder.
fn describe_metrics() {
    DESCRIBE.call_once(|| {
        describe_counter!(BATCHES_CREATED, "Batches recorded on the ledger, by token");
        describe_counter!(
            BATCH_TRANSITIONS,
            "Batch lifecycle transitions, by resulting status"
        );
        describe_counter!(SUBMISSIONS_SAVED, "Submissions written to the spreadsheet");
        describe_counter!(
            TEXT_GENERATION_REQUESTS,
            "Text generation proxy calls, by outcome"
        );
        describe_counter!(HTTP_REQUESTS, "HTTP requests served, by status code");
        describe_histogram!(HTTP_REQUEST_DURATION, "HTTP request latency");
    });
}

/// Records platform events. Cheap to clone.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    pub fn record_batch_created(&self, token: &str) {
        counter!(BATCHES_CREATED, "token" => token.to_string()).increment(1);
    }

    pub fn record_batch_transition(&self, status: &str) {
        counter!(BATCH_TRANSITIONS, "status" => status.to_string()).increment(1);
    }

    pub fn record_submission_saved(&self) {
        counter!(SUBMISSIONS_SAVED).increment(1);
    }

    /// `outcome` is one of `success`, `unavailable` or `error`.
    pub fn record_text_generation(&self, outcome: &'static str) {
        counter!(TEXT_GENERATION_REQUESTS, "outcome" => outcome).increment(1);
    }

    pub fn record_http_request(&self, status: u16, duration_secs: f64) {
        counter!(HTTP_REQUESTS, "status" => status.to_string()).increment(1);
        histogram!(HTTP_REQUEST_DURATION).record(duration_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        let metrics = MetricsCollector::new();
        metrics.record_batch_created("Cotton");
        metrics.record_http_request(200, 0.01);
    }

    #[test]
    fn test_counters_render_in_prometheus_format() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let metrics = MetricsCollector::new();
            metrics.record_batch_created("Wool");
            metrics.record_batch_transition("Approved");
            metrics.record_submission_saved();
            metrics.record_text_generation("success");
        });

        let rendered = handle.render();
        assert!(rendered.contains("aware_batches_created_total{token=\"Wool\"} 1"));
        assert!(rendered.contains("aware_batch_transitions_total{status=\"Approved\"} 1"));
        assert!(rendered.contains("aware_submissions_saved_total 1"));
        assert!(rendered.contains("aware_text_generation_requests_total{outcome=\"success\"} 1"));
    }
}
