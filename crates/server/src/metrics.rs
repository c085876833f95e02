//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the segmenta server:
//! - HTTP request metrics (latency, counts, in flight)
//! - In-flight conversion jobs (collected dynamically)
//! - Core pipeline metrics, registered from `segmenta_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "segmenta_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        // Uploads include the whole transcode
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
            300.0, 900.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("segmenta_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "segmenta_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Job Metrics (collected dynamically)
// =============================================================================

/// Conversion jobs currently running.
pub static ACTIVE_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "segmenta_active_jobs",
        "Number of conversion jobs currently running",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Jobs
    registry.register(Box::new(ACTIVE_JOBS.clone())).unwrap();

    // Core metrics (job results, durations, recovered errors)
    for metric in segmenta_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// This is called before encoding metrics to update gauges with current values.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    ACTIVE_JOBS.set(state.tracker().len() as i64);
}

static JOB_ID_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d+-[a-z0-9]*(/|$)").unwrap());
static STREAM_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/streams/\{id\}/[^/]+$").unwrap());

/// Normalize a path for metric labels (replace IDs and segment names with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = JOB_ID_SEGMENT.replace_all(path, "/{id}$1");
    let result = STREAM_FILE.replace(&result, "/streams/{id}/{file}");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_video_id() {
        let path = "/videos/1700000000000-myvacation";
        assert_eq!(normalize_path(path), "/videos/{id}");
    }

    #[test]
    fn test_normalize_path_job_id() {
        let path = "/api/v1/jobs/1700000000000-clip";
        assert_eq!(normalize_path(path), "/api/v1/jobs/{id}");
    }

    #[test]
    fn test_normalize_path_empty_basename() {
        let path = "/videos/1700000000000-";
        assert_eq!(normalize_path(path), "/videos/{id}");
    }

    #[test]
    fn test_normalize_path_stream_files() {
        assert_eq!(
            normalize_path("/streams/1700000000000-clip/index.m3u8"),
            "/streams/{id}/{file}"
        );
        assert_eq!(
            normalize_path("/streams/1700000000000-clip/index42.ts"),
            "/streams/{id}/{file}"
        );
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
        assert_eq!(normalize_path("/videos"), "/videos");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("segmenta_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        segmenta_core::metrics::PROBE_FAILURES.inc_by(0);
        ACTIVE_JOBS.set(0);

        let output = encode_metrics();
        assert!(output.contains("segmenta_active_jobs"));
        assert!(output.contains("segmenta_probe_failures_total"));
        assert!(output.contains("segmenta_progress_parse_failures_total"));
    }
}
