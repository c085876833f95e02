//! FFprobe-backed media prober.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::config::TranscoderConfig;
use super::error::ProbeError;
use super::traits::MediaProber;
use super::types::SourceCodecs;

/// Probes media files by running ffprobe.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    pub fn from_config(config: &TranscoderConfig) -> Self {
        Self::new(config.ffprobe_path.clone())
    }

    async fn run(&self, args: &[&str], path: &Path) -> Result<String, ProbeError> {
        let output = Command::new(&self.ffprobe_path)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProbeError::FfprobeNotFound {
                        path: self.ffprobe_path.clone(),
                    }
                } else {
                    ProbeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Parses the bare duration printed by
    /// `-show_entries format=duration -of default=noprint_wrappers=1:nokey=1`.
    pub fn parse_duration_output(output: &str) -> Result<f64, ProbeError> {
        let trimmed = output.trim();
        let duration = trimmed
            .parse::<f64>()
            .map_err(|_| ProbeError::Unparseable {
                output: trimmed.to_string(),
            })?;

        if !duration.is_finite() || duration <= 0.0 {
            return Err(ProbeError::NonPositiveDuration(duration));
        }
        Ok(duration)
    }

    /// Parses `-show_entries stream=codec_type,codec_name -of json` output.
    pub fn parse_codecs_output(output: &str) -> Result<SourceCodecs, ProbeError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            codec_name: Option<String>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|_| ProbeError::Unparseable {
                output: output.trim().to_string(),
            })?;

        let mut codecs = SourceCodecs::default();
        for stream in probe.streams {
            let Some(name) = stream.codec_name else {
                continue;
            };
            match stream.codec_type.as_deref() {
                Some("video") => codecs.video.push(name),
                Some("audio") => codecs.audio.push(name),
                _ => {}
            }
        }
        Ok(codecs)
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError> {
        let stdout = self
            .run(
                &[
                    "-v",
                    "error",
                    "-show_entries",
                    "format=duration",
                    "-of",
                    "default=noprint_wrappers=1:nokey=1",
                ],
                path,
            )
            .await?;
        Self::parse_duration_output(&stdout)
    }

    async fn probe_codecs(&self, path: &Path) -> Result<SourceCodecs, ProbeError> {
        let stdout = self
            .run(
                &[
                    "-v",
                    "error",
                    "-show_entries",
                    "stream=codec_type,codec_name",
                    "-of",
                    "json",
                ],
                path,
            )
            .await?;
        Self::parse_codecs_output(&stdout)
    }
}
