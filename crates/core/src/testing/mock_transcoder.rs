//! Mock transcoder for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::transcoder::{
    TranscodeError, TranscodeJob, TranscodeOutcome, TranscodeProgress, TranscoderStrategy,
};

/// Playlist written by the mock for successful jobs.
pub const MOCK_PLAYLIST: &str = "#EXTM3U\n\
    #EXT-X-VERSION:3\n\
    #EXT-X-TARGETDURATION:1\n\
    #EXT-X-PLAYLIST-TYPE:VOD\n\
    #EXTINF:1.0,\n\
    index0.ts\n\
    #EXTINF:1.0,\n\
    index1.ts\n\
    #EXT-X-ENDLIST\n";

/// A recorded transcode for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedTranscode {
    /// The job that was submitted.
    pub job: TranscodeJob,
    /// Contents of the input file when the transcode started, if readable.
    pub input_bytes: Option<Vec<u8>>,
    /// Whether the transcode succeeded.
    pub success: bool,
}

/// Mock implementation of [`TranscoderStrategy`].
///
/// Provides controllable behavior for testing:
/// - Record submitted jobs and the staged input they saw
/// - Emit a scripted sequence of progress percentages
/// - Fail with an injected error
/// - Block until cancelled
///
/// Successful jobs write a small playlist and two empty segments into the
/// output directory, like a real transcode would.
#[derive(Debug, Clone)]
pub struct MockTranscoder {
    name: String,
    jobs: Arc<RwLock<Vec<RecordedTranscode>>>,
    next_error: Arc<RwLock<Option<TranscodeError>>>,
    progress: Arc<RwLock<Vec<f32>>>,
    block_until_cancelled: Arc<RwLock<bool>>,
    extra_files: Arc<RwLock<Vec<(String, Vec<u8>)>>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    /// Create a new mock transcoder that succeeds immediately.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            jobs: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            progress: Arc::new(RwLock::new(Vec::new())),
            block_until_cancelled: Arc::new(RwLock::new(false)),
            extra_files: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Reports under a different strategy name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Emits these percentages, in order, before finishing.
    pub fn with_progress(self, percents: Vec<f32>) -> Self {
        Self {
            progress: Arc::new(RwLock::new(percents)),
            ..self
        }
    }

    /// Fails the first transcode with `error`.
    pub fn failing_with(self, error: TranscodeError) -> Self {
        Self {
            next_error: Arc::new(RwLock::new(Some(error))),
            ..self
        }
    }

    /// Waits for cancellation instead of finishing.
    pub fn blocking(self) -> Self {
        Self {
            block_until_cancelled: Arc::new(RwLock::new(true)),
            ..self
        }
    }

    /// Also writes `filename` into the output directory of successful jobs.
    pub fn with_extra_output(self, filename: impl Into<String>, contents: &[u8]) -> Self {
        Self {
            extra_files: Arc::new(RwLock::new(vec![(filename.into(), contents.to_vec())])),
            ..self
        }
    }

    /// Configure the next transcode to fail with the given error.
    pub async fn set_next_error(&self, error: TranscodeError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn set_progress(&self, percents: Vec<f32>) {
        *self.progress.write().await = percents;
    }

    pub async fn set_blocking(&self, blocking: bool) {
        *self.block_until_cancelled.write().await = blocking;
    }

    /// Get all recorded transcodes.
    pub async fn recorded_jobs(&self) -> Vec<RecordedTranscode> {
        self.jobs.read().await.clone()
    }

    /// Get the number of transcodes performed.
    pub async fn transcode_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    async fn record(&self, job: &TranscodeJob, input_bytes: Option<Vec<u8>>, success: bool) {
        self.jobs.write().await.push(RecordedTranscode {
            job: job.clone(),
            input_bytes,
            success,
        });
    }

    async fn write_output(&self, job: &TranscodeJob) -> std::io::Result<usize> {
        tokio::fs::create_dir_all(&job.output_dir).await?;
        tokio::fs::write(job.playlist_path(), MOCK_PLAYLIST).await?;
        for index in 0..2 {
            tokio::fs::write(job.output_dir.join(format!("index{}.ts", index)), b"").await?;
        }
        for (filename, contents) in self.extra_files.read().await.iter() {
            tokio::fs::write(job.output_dir.join(filename), contents).await?;
        }
        Ok(2)
    }
}

#[async_trait]
impl TranscoderStrategy for MockTranscoder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn transcode(
        &self,
        job: TranscodeJob,
        progress_tx: mpsc::Sender<TranscodeProgress>,
        cancel: CancellationToken,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        let input_bytes = tokio::fs::read(&job.input_path).await.ok();

        if let Some(err) = self.next_error.write().await.take() {
            self.record(&job, input_bytes, false).await;
            return Err(err);
        }

        let percents = self.progress.read().await.clone();
        for percent in percents {
            let _ = progress_tx
                .send(TranscodeProgress {
                    job_id: job.job_id.clone(),
                    percent,
                    elapsed_us: 0,
                })
                .await;
        }

        if *self.block_until_cancelled.read().await {
            cancel.cancelled().await;
            self.record(&job, input_bytes, false).await;
            return Err(TranscodeError::Cancelled);
        }

        let segment_count = self.write_output(&job).await?;
        self.record(&job, input_bytes, true).await;

        Ok(TranscodeOutcome {
            playlist_filename: job.segmentation.playlist_filename.clone(),
            segment_count,
            strategy: self.name.clone(),
            elapsed_ms: 0,
        })
    }
}
