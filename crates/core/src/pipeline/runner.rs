//! The conversion pipeline.

use chrono::{SubsecRound, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Config, StorageConfig};
use crate::identifier::{staging_extension, JobId, JobIdGenerator};
use crate::library::{CatalogReader, MetadataStore, StoredVideo, VideoRecord};
use crate::metrics::{JOBS_TOTAL, JOB_DURATION, PROBE_FAILURES};
use crate::transcoder::{
    MediaProber, SegmentationParams, TranscodeJob, TranscodeOutcome, TranscoderStrategy,
};

use super::staging::StagedFile;
use super::tracker::{ActiveJob, JobTracker, TrackedJob};
use super::types::{PipelineError, PipelineStage, ProgressCallback, Upload};

/// Capacity of the per-job progress channel. Progress beyond this is dropped
/// by the producer rather than stalling the transcoder.
const PROGRESS_CHANNEL_CAPACITY: usize = 32;

/// Drives uploads from raw bytes to a persisted catalog entry.
///
/// Every run has a unique job id, its own staging file and its own output
/// directory, so concurrent runs share nothing but the tracker.
pub struct ConversionPipeline {
    storage: StorageConfig,
    segmentation: SegmentationParams,
    ids: JobIdGenerator,
    strategy: Arc<dyn TranscoderStrategy>,
    prober: Arc<dyn MediaProber>,
    store: MetadataStore,
    tracker: JobTracker,
    progress_callback: Option<ProgressCallback>,
}

impl ConversionPipeline {
    pub fn new(
        config: &Config,
        strategy: Arc<dyn TranscoderStrategy>,
        prober: Arc<dyn MediaProber>,
    ) -> Self {
        Self {
            storage: config.storage.clone(),
            segmentation: SegmentationParams::new(
                config.transcoder.segment_duration_secs,
                config.storage.playlist_filename.clone(),
            ),
            ids: JobIdGenerator::new(),
            strategy,
            prober,
            store: MetadataStore::from_config(&config.storage),
            tracker: JobTracker::new(),
            progress_callback: None,
        }
    }

    /// Shares an existing tracker instead of a private one.
    pub fn with_tracker(mut self, tracker: JobTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// A reader over the catalog this pipeline writes to.
    pub fn catalog(&self) -> CatalogReader {
        CatalogReader::from_config(&self.storage)
    }

    /// Runs an upload to completion.
    pub async fn run<R>(&self, upload: Upload<R>) -> Result<VideoRecord, PipelineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.run_with_cancel(upload, CancellationToken::new()).await
    }

    /// Runs an upload, aborting when `cancel` fires. The staged upload is
    /// removed on every path.
    pub async fn run_with_cancel<R>(
        &self,
        upload: Upload<R>,
        cancel: CancellationToken,
    ) -> Result<VideoRecord, PipelineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let start = Instant::now();
        let result = self.execute(upload, cancel).await;

        let label = match &result {
            Ok(_) => "completed",
            Err(e) => e.result_label(),
        };
        JOBS_TOTAL.with_label_values(&[label]).inc();
        JOB_DURATION
            .with_label_values(&[self.strategy.name()])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    async fn execute<R>(
        &self,
        upload: Upload<R>,
        cancel: CancellationToken,
    ) -> Result<VideoRecord, PipelineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        // RECEIVED
        let Upload {
            original_name,
            mut reader,
        } = upload;
        let original_name = match original_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                return Err(PipelineError::InvalidInput(
                    "upload has no filename".to_string(),
                ))
            }
        };

        // Stored with millisecond precision
        let uploaded_at = Utc::now().trunc_subsecs(3);
        let job_id = self.ids.generate(&original_name);
        let tracked = self.tracker.register(
            ActiveJob {
                id: job_id.to_string(),
                original_name: original_name.clone(),
                stage: PipelineStage::Received,
                percent: None,
                strategy: self.strategy.name().to_string(),
                started_at: uploaded_at,
            },
            cancel.clone(),
        );
        info!(job_id = %job_id, original_name = %original_name, "Upload received");

        // STAGED
        self.storage
            .ensure_directories()
            .await
            .map_err(PipelineError::Staging)?;
        let staging_path = self.storage.staging_root.join(format!(
            "{}{}",
            job_id,
            staging_extension(&original_name)
        ));
        let mut staged = StagedFile::create(staging_path)
            .await
            .map_err(PipelineError::Staging)?;

        let bytes = tokio::select! {
            written = staged.fill(&mut reader) => written.map_err(PipelineError::Staging)?,
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
        };

        let output_dir = self.store.video_dir(job_id.as_str());
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(PipelineError::Staging)?;
        tracked.set_stage(PipelineStage::Staged);
        info!(job_id = %job_id, bytes, path = %staged.path().display(), "Upload staged");

        // PROBED
        let duration_secs = match self.prober.probe_duration(staged.path()).await {
            Ok(duration) => duration,
            Err(e) => {
                PROBE_FAILURES.inc();
                warn!(job_id = %job_id, error = %e, "Duration probe failed, progress disabled");
                0.0
            }
        };
        tracked.set_stage(PipelineStage::Probed);
        debug!(job_id = %job_id, duration_secs, "Probed upload");

        // ENCODING
        tracked.set_stage(PipelineStage::Encoding);
        info!(job_id = %job_id, strategy = self.strategy.name(), "Encoding");
        let mut progress =
            ProgressReporter::new(&job_id, &tracked, self.progress_callback.as_ref());
        let job = TranscodeJob {
            job_id: job_id.to_string(),
            input_path: staged.path().to_path_buf(),
            output_dir,
            duration_secs,
            segmentation: self.segmentation.clone(),
        };
        let encoded = self.encode(job, &mut progress, cancel).await;

        // CLEANUP, before the outcome is inspected
        if let Err(e) = staged.remove().await {
            warn!(job_id = %job_id, error = %e, "Failed to remove staged upload");
        }

        let outcome = encoded.inspect_err(|e| {
            warn!(job_id = %job_id, error = %e, "Encoding failed");
        })?;

        // PERSISTED
        let stored = StoredVideo {
            id: job_id.to_string(),
            original_name,
            uploaded_at,
        };
        self.store.write(&stored).await?;
        tracked.set_stage(PipelineStage::Persisted);
        progress.report(100.0);

        info!(
            job_id = %job_id,
            strategy = %outcome.strategy,
            segments = outcome.segment_count,
            elapsed_ms = outcome.elapsed_ms,
            "Job completed"
        );

        Ok(VideoRecord::from_stored(
            stored,
            job_id.as_str(),
            &self.storage.playlist_filename,
        ))
    }

    /// Runs the strategy while forwarding its progress events.
    async fn encode(
        &self,
        job: TranscodeJob,
        progress: &mut ProgressReporter<'_>,
        cancel: CancellationToken,
    ) -> Result<TranscodeOutcome, PipelineError> {
        let (tx, mut rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
        let transcode = self.strategy.transcode(job, tx, cancel);
        tokio::pin!(transcode);

        let result = loop {
            tokio::select! {
                result = &mut transcode => break result,
                Some(event) = rx.recv() => progress.report(event.percent),
            }
        };

        // Events sent just before the strategy returned
        while let Ok(event) = rx.try_recv() {
            progress.report(event.percent);
        }

        result.map_err(PipelineError::from)
    }
}

/// Enforces non-decreasing, capped progress and fans it out.
struct ProgressReporter<'a> {
    job_id: &'a JobId,
    tracked: &'a TrackedJob,
    callback: Option<&'a ProgressCallback>,
    last: Option<f32>,
}

impl<'a> ProgressReporter<'a> {
    fn new(
        job_id: &'a JobId,
        tracked: &'a TrackedJob,
        callback: Option<&'a ProgressCallback>,
    ) -> Self {
        Self {
            job_id,
            tracked,
            callback,
            last: None,
        }
    }

    fn report(&mut self, percent: f32) {
        if !percent.is_finite() {
            return;
        }
        let percent = percent.clamp(0.0, 100.0);
        if self.last.is_some_and(|last| percent <= last) {
            return;
        }

        let previous_whole = self.last.map(|p| p.floor());
        self.last = Some(percent);
        self.tracked.set_percent(percent);

        if previous_whole != Some(percent.floor()) {
            debug!(job_id = %self.job_id, percent, "Progress");
        }
        if let Some(callback) = self.callback {
            callback(self.job_id, percent);
        }
    }
}
