//! Metrics collection for contribution-service.
//!
//! Counters and histograms go through the `metrics` facade; the Prometheus
//! recorder installed by [`init_metrics`] renders them for `/metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize metrics collection. Calling it twice is a no-op.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!("Failed to install Prometheus recorder: {}", e),
    }
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Record the terminal outcome of one submission.
pub fn record_submission(outcome: &'static str, elapsed: Duration) {
    metrics::counter!("submission_total", "outcome" => outcome).increment(1);
    metrics::histogram!("submission_duration_seconds", "outcome" => outcome)
        .record(elapsed.as_secs_f64());
}

/// Record a submit call refused before any work started.
pub fn record_submission_rejected(reason: &'static str) {
    metrics::counter!("submission_rejected_total", "reason" => reason).increment(1);
}

pub fn record_notification_insert(kind: &str) {
    metrics::counter!("notification_insert_total", "kind" => kind.to_string()).increment(1);
}
