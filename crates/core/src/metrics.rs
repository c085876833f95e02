//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversion jobs (results, duration per strategy)
//! - Recovered errors (duration probe failures, unparseable progress lines)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Conversion jobs total by result.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("segmenta_jobs_total", "Total conversion jobs"),
        // "completed", "invalid_input", "staging_failed", "transcode_failed",
        // "persist_failed", "cancelled"
        &["result"],
    )
    .unwrap()
});

/// Conversion job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "segmenta_job_duration_seconds",
            "Duration of conversion jobs, upload staging included",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0]),
        &["strategy"],
    )
    .unwrap()
});

// =============================================================================
// Recovered Errors
// =============================================================================

/// Duration probes that failed; the job continued without progress.
pub static PROBE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "segmenta_probe_failures_total",
        "Duration probes that failed",
    )
    .unwrap()
});

/// Progress lines whose elapsed-time value couldn't be parsed.
pub static PROGRESS_PARSE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "segmenta_progress_parse_failures_total",
        "Transcoder progress lines that couldn't be parsed",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(PROBE_FAILURES.clone()),
        Box::new(PROGRESS_PARSE_FAILURES.clone()),
    ]
}
