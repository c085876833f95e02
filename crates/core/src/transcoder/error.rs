//! Error types for the transcoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while producing an HLS rendition.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// The transcoder exited unsuccessfully or was killed by a signal.
    #[error("Transcoder exited with status {}", display_status(.status))]
    ProcessFailed {
        /// Exit code, `None` when terminated by a signal.
        status: Option<i32>,
        /// Tail of the transcoder's diagnostic output.
        diagnostics: String,
    },

    /// The transcoder exited successfully but left no playlist behind.
    #[error("Playlist not produced: {path}")]
    PlaylistMissing { path: PathBuf },

    /// The source can't be stream-copied into segments.
    #[error("Source not compatible with segment copy: {reason}")]
    IncompatibleSource { reason: String },

    /// Transcode timed out.
    #[error("Transcode timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Transcode was cancelled by the caller.
    #[error("Transcode cancelled")]
    Cancelled,

    /// I/O error while driving the transcoder.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

impl TranscodeError {
    /// Creates a process failure from an exit code and captured output.
    pub fn process_failed(status: Option<i32>, diagnostics: impl Into<String>) -> Self {
        Self::ProcessFailed {
            status,
            diagnostics: diagnostics.into(),
        }
    }

    /// Creates an incompatible source error.
    pub fn incompatible_source(reason: impl Into<String>) -> Self {
        Self::IncompatibleSource {
            reason: reason.into(),
        }
    }

    /// Whether the caller asked for this failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors from probing a media file. Always recovered by the caller.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// FFprobe exited unsuccessfully.
    #[error("ffprobe failed: {stderr}")]
    Failed { stderr: String },

    /// FFprobe output wasn't understood.
    #[error("Unparseable probe output: {output:?}")]
    Unparseable { output: String },

    /// The file reports no positive duration.
    #[error("Probe returned non-positive duration: {0}")]
    NonPositiveDuration(f64),

    /// I/O error while running ffprobe.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
