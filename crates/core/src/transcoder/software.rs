//! Software re-encode strategy.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::ffmpeg::FfmpegRunner;
use super::traits::TranscoderStrategy;
use super::types::{EncodeProfile, TranscodeJob, TranscodeOutcome, TranscodeProgress};

/// Re-encodes every upload to H.264/AAC with the height capped.
pub struct SoftwareTranscoder {
    runner: FfmpegRunner,
    profile: EncodeProfile,
}

impl SoftwareTranscoder {
    pub fn new(config: TranscoderConfig) -> Self {
        let profile = EncodeProfile::software(config.max_height, config.preset.clone());
        Self {
            runner: FfmpegRunner::new(config),
            profile,
        }
    }

    pub fn profile(&self) -> &EncodeProfile {
        &self.profile
    }
}

#[async_trait]
impl TranscoderStrategy for SoftwareTranscoder {
    fn name(&self) -> &str {
        "software"
    }

    async fn transcode(
        &self,
        job: TranscodeJob,
        progress_tx: mpsc::Sender<TranscodeProgress>,
        cancel: CancellationToken,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        info!(
            job_id = %job.job_id,
            duration_secs = job.duration_secs,
            "Re-encoding upload"
        );
        self.runner
            .run(self.name(), &job, &self.profile, progress_tx, cancel)
            .await
    }
}
