//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::{ProbeError, TranscodeError};
use super::types::{SourceCodecs, TranscodeJob, TranscodeOutcome, TranscodeProgress};

/// A way of turning a staged upload into an HLS playlist plus segments.
///
/// Implementations report progress on `progress_tx` on a best-effort basis:
/// a full or closed channel never fails the transcode, and a progress line
/// that can't be parsed is skipped. Cancelling `cancel` terminates the
/// underlying process and yields [`TranscodeError::Cancelled`]. Cleaning up
/// the input or output is the caller's job.
#[async_trait]
pub trait TranscoderStrategy: Send + Sync {
    /// Returns the name of this strategy.
    fn name(&self) -> &str;

    /// Transcodes `job.input_path` into `job.output_dir`.
    async fn transcode(
        &self,
        job: TranscodeJob,
        progress_tx: mpsc::Sender<TranscodeProgress>,
        cancel: CancellationToken,
    ) -> Result<TranscodeOutcome, TranscodeError>;
}

/// Reads stream information from media files.
///
/// Probe failures are never fatal to a job; callers decide how to degrade.
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Duration of the media in seconds. Always positive on success.
    async fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError>;

    /// Codecs of the video and audio streams.
    async fn probe_codecs(&self, path: &Path) -> Result<SourceCodecs, ProbeError>;
}
