//! Types for the conversion pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::identifier::JobId;
use crate::library::CatalogError;
use crate::transcoder::TranscodeError;

/// Where a job is in its run. Cleanup of the staged upload is not a stage:
/// it happens on every exit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    Staged,
    Probed,
    Encoding,
    Persisted,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Staged => "staged",
            Self::Probed => "probed",
            Self::Encoding => "encoding",
            Self::Persisted => "persisted",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inbound upload: the client-supplied filename and a byte source.
pub struct Upload<R> {
    pub original_name: Option<String>,
    pub reader: R,
}

impl<R> Upload<R> {
    pub fn new(original_name: impl Into<String>, reader: R) -> Self {
        Self {
            original_name: Some(original_name.into()),
            reader,
        }
    }

    /// An upload without a filename. Always rejected.
    pub fn unnamed(reader: R) -> Self {
        Self {
            original_name: None,
            reader,
        }
    }
}

/// Receives `(job id, percent)` progress reports. Values are non-decreasing
/// per job and never exceed 100. Must not block.
pub type ProgressCallback = Arc<dyn Fn(&JobId, f32) + Send + Sync>;

/// Error type for pipeline runs.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upload was rejected before touching the filesystem.
    #[error("Invalid upload: {0}")]
    InvalidInput(String),

    /// Writing the raw upload or creating the output directory failed.
    #[error("Failed to stage upload: {0}")]
    Staging(#[source] std::io::Error),

    #[error("Transcode failed: {0}")]
    Transcode(#[source] TranscodeError),

    /// The transcode finished but the metadata record couldn't be written.
    /// Segments stay on disk without a record.
    #[error("Failed to persist metadata: {0}")]
    Persist(#[from] CatalogError),

    #[error("Job was cancelled")]
    Cancelled,
}

impl From<TranscodeError> for PipelineError {
    fn from(e: TranscodeError) -> Self {
        if e.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Transcode(e)
        }
    }
}

impl PipelineError {
    /// Whether the caller caused this error.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Label used in the `result` dimension of job metrics.
    pub fn result_label(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Staging(_) => "staging_failed",
            Self::Transcode(_) => "transcode_failed",
            Self::Persist(_) => "persist_failed",
            Self::Cancelled => "cancelled",
        }
    }
}
