//! Hardware encoder capability detection.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::config::TranscoderConfig;

/// Available hardware encoders detected on the system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderCapabilities {
    /// NVIDIA NVENC H.264 available
    pub h264_nvenc: bool,
    /// NVIDIA NVENC H.265/HEVC available
    pub hevc_nvenc: bool,
    /// Intel Quick Sync H.264 available
    pub h264_qsv: bool,
    /// AMD AMF H.264 available
    pub h264_amf: bool,
    /// VA-API H.264 available (Linux)
    pub h264_vaapi: bool,
}

impl EncoderCapabilities {
    /// Detect available hardware encoders by probing ffmpeg.
    pub async fn detect(config: &TranscoderConfig) -> Self {
        let output = Command::new(&config.ffmpeg_path)
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(o) if o.status.success() => Self::from_encoder_listing(&format!(
                "{}\n{}",
                String::from_utf8_lossy(&o.stdout),
                String::from_utf8_lossy(&o.stderr)
            )),
            Ok(o) => {
                tracing::warn!(status = ?o.status.code(), "ffmpeg -encoders failed");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not run ffmpeg to detect encoders");
                Self::default()
            }
        }
    }

    /// Parses the output of `ffmpeg -encoders`.
    pub fn from_encoder_listing(listing: &str) -> Self {
        Self {
            h264_nvenc: listing.contains("h264_nvenc"),
            hevc_nvenc: listing.contains("hevc_nvenc"),
            h264_qsv: listing.contains("h264_qsv"),
            h264_amf: listing.contains("h264_amf"),
            h264_vaapi: listing.contains("h264_vaapi"),
        }
    }

    /// Check if any hardware encoder is available.
    pub fn has_hardware_encoder(&self) -> bool {
        self.h264_nvenc || self.hevc_nvenc || self.h264_qsv || self.h264_amf || self.h264_vaapi
    }

    /// Check if NVENC is available.
    pub fn has_nvenc(&self) -> bool {
        self.h264_nvenc || self.hevc_nvenc
    }
}

/// Identifying info about the accelerator device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceleratorInfo {
    /// Free-form description as reported by the driver tool.
    pub description: String,
}

impl AcceleratorInfo {
    /// Queries nvidia-smi for device name, driver and memory, falling back to
    /// the device list. `None` when neither yields anything.
    pub async fn query(config: &TranscoderConfig) -> Option<Self> {
        let attempts: [&[&str]; 2] = [
            &[
                "--query-gpu=name,driver_version,memory.total",
                "--format=csv,noheader",
            ],
            &["-L"],
        ];

        for args in attempts {
            if let Some(description) = run_for_stdout(&config.nvidia_smi_path, args).await {
                return Some(Self { description });
            }
        }
        None
    }
}

async fn run_for_stdout(program: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (output.status.success() && !stdout.is_empty()).then_some(stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_capabilities() {
        let caps = EncoderCapabilities::default();
        assert!(!caps.h264_nvenc);
        assert!(!caps.has_hardware_encoder());
        assert!(!caps.has_nvenc());
    }

    #[test]
    fn test_from_encoder_listing() {
        let listing = "\
Encoders:
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10 (codec h264)
 V....D h264_nvenc           NVIDIA NVENC H.264 encoder (codec h264)
 V....D h264_vaapi           H.264/AVC (VAAPI) (codec h264)
 A....D aac                  AAC (Advanced Audio Coding)
";
        let caps = EncoderCapabilities::from_encoder_listing(listing);
        assert!(caps.h264_nvenc);
        assert!(!caps.hevc_nvenc);
        assert!(caps.h264_vaapi);
        assert!(caps.has_nvenc());
        assert!(caps.has_hardware_encoder());
    }

    #[test]
    fn test_software_only_listing() {
        let caps = EncoderCapabilities::from_encoder_listing(" V....D libx264  libx264 H.264");
        assert!(!caps.has_hardware_encoder());
    }

    #[tokio::test]
    async fn test_detect_without_ffmpeg_is_empty() {
        let config = TranscoderConfig::with_paths(
            PathBuf::from("/nonexistent/ffmpeg"),
            PathBuf::from("/nonexistent/ffprobe"),
        );
        let caps = EncoderCapabilities::detect(&config).await;
        assert_eq!(caps, EncoderCapabilities::default());
    }

    #[tokio::test]
    async fn test_accelerator_info_without_tool_is_none() {
        let config = TranscoderConfig {
            nvidia_smi_path: PathBuf::from("/nonexistent/nvidia-smi"),
            ..Default::default()
        };
        assert!(AcceleratorInfo::query(&config).await.is_none());
    }
}
