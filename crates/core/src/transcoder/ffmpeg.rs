//! FFmpeg process driver shared by every strategy.

use std::collections::VecDeque;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::progress::{parse_line, percent_of, ProgressLine, ProgressTracker};
use super::types::{EncodeProfile, TranscodeJob, TranscodeOutcome, TranscodeProgress};
use crate::metrics::PROGRESS_PARSE_FAILURES;

/// Diagnostic lines kept for error reports.
const DIAGNOSTIC_TAIL_LINES: usize = 64;

/// Runs ffmpeg to produce an HLS rendition and streams its progress.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    config: TranscoderConfig,
}

impl FfmpegRunner {
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranscoderConfig {
        &self.config
    }

    /// Builds ffmpeg arguments for an HLS VOD rendition.
    pub fn build_args(&self, job: &TranscodeJob, profile: &EncodeProfile) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-nostats".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            job.input_path.to_string_lossy().to_string(),
        ];

        match profile {
            EncodeProfile::Reencode {
                max_height,
                video_codec,
                audio_codec,
                preset,
            } => {
                args.extend([
                    // Never upscale; -2 keeps the width even for x264
                    "-vf".to_string(),
                    format!("scale=-2:'min({},ih)'", max_height),
                    "-c:v".to_string(),
                    video_codec.clone(),
                    "-preset".to_string(),
                    preset.clone(),
                    "-c:a".to_string(),
                    audio_codec.clone(),
                ]);
            }
            EncodeProfile::Copy => {
                args.extend([
                    "-c:v".to_string(),
                    "copy".to_string(),
                    "-c:a".to_string(),
                    "copy".to_string(),
                ]);
            }
        }

        // Segmentation
        args.extend([
            "-f".to_string(),
            "hls".to_string(),
            "-hls_time".to_string(),
            job.segmentation.segment_duration_secs.to_string(),
            "-hls_playlist_type".to_string(),
            "vod".to_string(),
            "-hls_segment_filename".to_string(),
            job.segment_path_pattern().to_string_lossy().to_string(),
        ]);

        // Log level and progress
        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ]);

        // Extra args
        args.extend(self.config.extra_ffmpeg_args.iter().cloned());

        // Output
        args.push(job.playlist_path().to_string_lossy().to_string());

        args
    }

    /// Runs ffmpeg for `job` with `profile`, labelling the outcome with `strategy`.
    pub async fn run(
        &self,
        strategy: &str,
        job: &TranscodeJob,
        profile: &EncodeProfile,
        progress_tx: mpsc::Sender<TranscodeProgress>,
        cancel: CancellationToken,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        let start = Instant::now();
        let args = self.build_args(job, profile);
        debug!(job_id = %job.job_id, ?args, "Spawning ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("ffmpeg stderr was not captured"))?;

        // The side channel is drained on its own task so the process never
        // blocks on a full pipe while we wait on it.
        let reader = tokio::spawn(consume_side_channel(
            stderr,
            job.job_id.clone(),
            job.duration_secs,
            progress_tx,
        ));

        let waited = self.wait(&mut child, &cancel).await;
        let diagnostics = reader.await.unwrap_or_else(|e| {
            warn!(job_id = %job.job_id, error = %e, "Progress reader task failed");
            String::new()
        });

        let status = waited?;
        if !status.success() {
            return Err(TranscodeError::process_failed(status.code(), diagnostics));
        }

        let playlist_path = job.playlist_path();
        if !tokio::fs::try_exists(&playlist_path).await? {
            return Err(TranscodeError::PlaylistMissing {
                path: playlist_path,
            });
        }

        let segment_count = count_segments(&job.output_dir).await?;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            job_id = %job.job_id,
            strategy,
            segment_count,
            elapsed_ms,
            "Transcode finished"
        );

        Ok(TranscodeOutcome {
            playlist_filename: job.segmentation.playlist_filename.clone(),
            segment_count,
            strategy: strategy.to_string(),
            elapsed_ms,
        })
    }

    /// Waits for the process, killing it on cancellation or timeout.
    async fn wait(
        &self,
        child: &mut Child,
        cancel: &CancellationToken,
    ) -> Result<ExitStatus, TranscodeError> {
        let timeout = self.config.timeout();
        let deadline = async {
            match timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            status = child.wait() => Ok(status?),
            _ = cancel.cancelled() => {
                let _ = child.kill().await;
                Err(TranscodeError::Cancelled)
            }
            _ = deadline => {
                let _ = child.kill().await;
                Err(TranscodeError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        }
    }
}

/// Reads the diagnostic stream line by line until EOF, forwarding progress
/// and returning the tail of the non-progress output.
async fn consume_side_channel<R>(
    stream: R,
    job_id: String,
    duration_secs: f64,
    progress_tx: mpsc::Sender<TranscodeProgress>,
) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut tracker = ProgressTracker::new(duration_secs);
    let mut tail: VecDeque<String> = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);
    let mut buf = Vec::new();

    if percent_of(0, duration_secs).is_none() {
        debug!(job_id = %job_id, "Duration unknown, progress reporting disabled");
    }

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Failed reading ffmpeg output");
                break;
            }
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end();
        match parse_line(line) {
            ProgressLine::Elapsed(elapsed_us) => {
                if let Some(percent) = tracker.observe(elapsed_us) {
                    let progress = TranscodeProgress {
                        job_id: job_id.clone(),
                        percent,
                        elapsed_us,
                    };
                    // Non-blocking send
                    let _ = progress_tx.try_send(progress);
                }
            }
            ProgressLine::Malformed(value) => {
                PROGRESS_PARSE_FAILURES.inc();
                debug!(job_id = %job_id, value = %value, "Skipping unparseable progress value");
            }
            ProgressLine::OtherKey => {}
            ProgressLine::Diagnostic => {
                if line.is_empty() {
                    continue;
                }
                debug!(job_id = %job_id, "ffmpeg: {}", line);
                if tail.len() == DIAGNOSTIC_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line.to_string());
            }
        }
    }

    tail.into_iter().collect::<Vec<_>>().join("\n")
}

/// Counts `.ts` segments in `dir`.
async fn count_segments(dir: &Path) -> std::io::Result<usize> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut count = 0;
    while let Some(entry) = entries.next_entry().await? {
        let is_segment = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ts"));
        if is_segment {
            count += 1;
        }
    }
    Ok(count)
}
