//! Accelerator-host strategy: remux with stream copy.
//!
//! Copying is only safe when the source bitstreams fit MPEG-TS segments.
//! Sources that don't are either re-encoded in software or rejected,
//! depending on `copy_fallback_to_software`.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::capabilities::AcceleratorInfo;
use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::ffmpeg::FfmpegRunner;
use super::traits::{MediaProber, TranscoderStrategy};
use super::types::{EncodeProfile, TranscodeJob, TranscodeOutcome, TranscodeProgress};

/// Label used when a copy-incompatible source was re-encoded instead.
pub const FALLBACK_STRATEGY_LABEL: &str = "accelerated+software-fallback";

pub struct AcceleratedTranscoder {
    runner: FfmpegRunner,
    prober: Arc<dyn MediaProber>,
    accelerator: Option<AcceleratorInfo>,
    fallback: EncodeProfile,
    copy_fallback: bool,
}

impl AcceleratedTranscoder {
    pub fn new(
        config: TranscoderConfig,
        prober: Arc<dyn MediaProber>,
        accelerator: Option<AcceleratorInfo>,
    ) -> Self {
        let fallback = EncodeProfile::software(config.max_height, config.preset.clone());
        let copy_fallback = config.copy_fallback_to_software;
        Self {
            runner: FfmpegRunner::new(config),
            prober,
            accelerator,
            fallback,
            copy_fallback,
        }
    }

    pub fn accelerator(&self) -> Option<&AcceleratorInfo> {
        self.accelerator.as_ref()
    }

    /// Picks stream copy when the source allows it.
    pub async fn choose_profile(
        &self,
        job: &TranscodeJob,
    ) -> Result<EncodeProfile, TranscodeError> {
        let codecs = match self.prober.probe_codecs(&job.input_path).await {
            Ok(codecs) => codecs,
            Err(e) => {
                // ffmpeg will fail loudly if the guess is wrong
                warn!(
                    job_id = %job.job_id,
                    error = %e,
                    "Codec probe failed, attempting stream copy"
                );
                return Ok(EncodeProfile::Copy);
            }
        };

        let problems = codecs.copy_incompatibilities();
        if problems.is_empty() {
            return Ok(EncodeProfile::Copy);
        }

        let reason = problems.join(", ");
        if self.copy_fallback {
            warn!(
                job_id = %job.job_id,
                reason = %reason,
                "Source can't be stream-copied, re-encoding in software"
            );
            Ok(self.fallback.clone())
        } else {
            Err(TranscodeError::incompatible_source(reason))
        }
    }
}

#[async_trait]
impl TranscoderStrategy for AcceleratedTranscoder {
    fn name(&self) -> &str {
        "accelerated"
    }

    async fn transcode(
        &self,
        job: TranscodeJob,
        progress_tx: mpsc::Sender<TranscodeProgress>,
        cancel: CancellationToken,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        match &self.accelerator {
            Some(info) => info!(
                job_id = %job.job_id,
                accelerator = %info.description,
                "Remuxing upload"
            ),
            None => info!(job_id = %job.job_id, "Remuxing upload, device info unavailable"),
        }

        let profile = self.choose_profile(&job).await?;
        let label = if profile.is_copy() {
            self.name()
        } else {
            FALLBACK_STRATEGY_LABEL
        };

        self.runner
            .run(label, &job, &profile, progress_tx, cancel)
            .await
    }
}
