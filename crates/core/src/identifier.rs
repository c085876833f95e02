//! Job identifiers derived from the uploaded filename and submission time.
//!
//! An identifier has the form `<millisecond-timestamp>-<normalized-basename>`,
//! where the basename is the part of the original filename before the first
//! `.`, lower-cased, with every character outside `[a-z0-9]` removed. The same
//! string names the job's output directory and is the public video id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Extension used for the staged raw upload when the original has none.
pub const DEFAULT_STAGING_EXTENSION: &str = ".mp4";

/// Identifier of a single conversion job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Builds an identifier from an explicit timestamp.
    pub fn from_parts(timestamp_ms: u64, original_filename: &str) -> Self {
        Self(format!(
            "{}-{}",
            timestamp_ms,
            normalize_basename(original_filename)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Timestamp prefix in milliseconds.
    pub fn timestamp_ms(&self) -> Option<u64> {
        self.0.split('-').next().and_then(|t| t.parse().ok())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lower-cases the part before the first `.` and keeps only `[a-z0-9]`.
pub fn normalize_basename(original_filename: &str) -> String {
    let stem = original_filename.split('.').next().unwrap_or_default();
    stem.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Extension (with leading dot) for the staged raw file.
///
/// The original extension is kept as-is when it is plain alphanumeric,
/// otherwise [`DEFAULT_STAGING_EXTENSION`] is used.
pub fn staging_extension(original_filename: &str) -> String {
    Path::new(original_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| DEFAULT_STAGING_EXTENSION.to_string())
}

/// Generates job identifiers from the wall clock.
///
/// Timestamps handed out by one generator are strictly increasing, so two
/// uploads landing in the same millisecond still get distinct identifiers.
#[derive(Debug, Default)]
pub struct JobIdGenerator {
    last_ms: AtomicU64,
}

impl JobIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates an identifier for `original_filename`.
    pub fn generate(&self, original_filename: &str) -> JobId {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let timestamp = self.next_timestamp(now);
        JobId::from_parts(timestamp, original_filename)
    }

    fn next_timestamp(&self, now: u64) -> u64 {
        let mut current = self.last_ms.load(Ordering::Relaxed);
        loop {
            let next = now.max(current + 1);
            match self.last_ms.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }
}
