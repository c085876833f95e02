//! Configuration for the transcoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which transcoder strategy to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscoderMode {
    /// Accelerated when a hardware encoder is detected, software otherwise.
    #[default]
    Auto,
    /// Always re-encode in software.
    Software,
    /// Always remux with stream copy.
    Accelerated,
}

/// Configuration for the FFmpeg-based transcoders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Path to nvidia-smi, queried for accelerator info.
    #[serde(default = "default_nvidia_smi_path")]
    pub nvidia_smi_path: PathBuf,

    /// Strategy selection.
    #[serde(default)]
    pub mode: TranscoderMode,

    /// Target HLS segment duration in seconds.
    #[serde(default = "default_segment_duration")]
    pub segment_duration_secs: u32,

    /// Maximum output height for software re-encoding.
    #[serde(default = "default_max_height")]
    pub max_height: u32,

    /// x264 preset for software re-encoding.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Timeout for a single transcode in seconds. 0 disables the timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Re-encode in software when a source can't be stream-copied into segments.
    #[serde(default = "default_copy_fallback")]
    pub copy_fallback_to_software: bool,

    /// Additional global ffmpeg arguments.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_nvidia_smi_path() -> PathBuf {
    PathBuf::from("nvidia-smi")
}

fn default_segment_duration() -> u32 {
    1
}

fn default_max_height() -> u32 {
    1080
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_timeout() -> u64 {
    3600 // 1 hour
}

fn default_log_level() -> String {
    "warning".to_string()
}

fn default_copy_fallback() -> bool {
    true
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            nvidia_smi_path: default_nvidia_smi_path(),
            mode: TranscoderMode::default(),
            segment_duration_secs: default_segment_duration(),
            max_height: default_max_height(),
            preset: default_preset(),
            timeout_secs: default_timeout(),
            ffmpeg_log_level: default_log_level(),
            copy_fallback_to_software: default_copy_fallback(),
            extra_ffmpeg_args: Vec::new(),
        }
    }
}

impl TranscoderConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    /// Sets the strategy mode.
    pub fn with_mode(mut self, mode: TranscoderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// The timeout as a duration, if enabled.
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_secs > 0).then(|| std::time::Duration::from_secs(self.timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TranscoderConfig::default();
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.ffprobe_path, PathBuf::from("ffprobe"));
        assert_eq!(config.mode, TranscoderMode::Auto);
        assert_eq!(config.segment_duration_secs, 1);
        assert_eq!(config.max_height, 1080);
        assert_eq!(config.timeout_secs, 3600);
        assert!(config.copy_fallback_to_software);
    }

    #[test]
    fn test_config_builder() {
        let config = TranscoderConfig::with_paths(
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffprobe"),
        )
        .with_mode(TranscoderMode::Software)
        .with_timeout(7200);

        assert_eq!(config.ffmpeg_path, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(config.mode, TranscoderMode::Software);
        assert_eq!(config.timeout(), Some(std::time::Duration::from_secs(7200)));
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = TranscoderConfig::default().with_timeout(0);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_mode_serialization() {
        let json = serde_json::to_string(&TranscoderMode::Accelerated).unwrap();
        assert_eq!(json, "\"accelerated\"");
        let parsed: TranscoderMode = serde_json::from_str("\"software\"").unwrap();
        assert_eq!(parsed, TranscoderMode::Software);
    }
}
