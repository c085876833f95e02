//! Types for the transcoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Segment filename pattern handed to ffmpeg; `%d` is the segment index.
pub const SEGMENT_FILENAME_PATTERN: &str = "index%d.ts";

/// Segmentation parameters shared by every strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationParams {
    /// Target segment duration in seconds.
    pub segment_duration_secs: u32,
    /// Playlist filename inside the output directory.
    pub playlist_filename: String,
    /// Segment filename pattern inside the output directory.
    pub segment_pattern: String,
}

impl SegmentationParams {
    pub fn new(segment_duration_secs: u32, playlist_filename: impl Into<String>) -> Self {
        Self {
            segment_duration_secs,
            playlist_filename: playlist_filename.into(),
            segment_pattern: SEGMENT_FILENAME_PATTERN.to_string(),
        }
    }
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self::new(1, "index.m3u8")
    }
}

/// A single transcode request.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    /// Job identifier, for logging and progress events.
    pub job_id: String,
    /// Staged raw upload.
    pub input_path: PathBuf,
    /// Directory receiving playlist and segments. Must exist.
    pub output_dir: PathBuf,
    /// Probed duration in seconds; 0 when unknown.
    pub duration_secs: f64,
    /// Segmentation parameters.
    pub segmentation: SegmentationParams,
}

impl TranscodeJob {
    pub fn playlist_path(&self) -> PathBuf {
        self.output_dir.join(&self.segmentation.playlist_filename)
    }

    pub fn segment_path_pattern(&self) -> PathBuf {
        self.output_dir.join(&self.segmentation.segment_pattern)
    }
}

/// Progress of a running transcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeProgress {
    /// Job identifier.
    pub job_id: String,
    /// Completion percentage in `[0, 100]`.
    pub percent: f32,
    /// Media time processed so far, in microseconds.
    pub elapsed_us: u64,
}

/// Result of a successful transcode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeOutcome {
    /// Playlist filename inside the output directory.
    pub playlist_filename: String,
    /// Number of media segments written.
    pub segment_count: usize,
    /// Name of the strategy that produced the output.
    pub strategy: String,
    /// Wall time spent transcoding, in milliseconds.
    pub elapsed_ms: u64,
}

/// Codec pair the transcoder is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeProfile {
    /// Re-encode to H.264/AAC, capping height.
    Reencode {
        max_height: u32,
        video_codec: String,
        audio_codec: String,
        preset: String,
    },
    /// Stream-copy the existing bitstreams into segments.
    Copy,
}

impl EncodeProfile {
    /// The fixed software profile: H.264 + AAC, height capped, given preset.
    pub fn software(max_height: u32, preset: impl Into<String>) -> Self {
        Self::Reencode {
            max_height,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: preset.into(),
        }
    }

    pub fn is_copy(&self) -> bool {
        matches!(self, Self::Copy)
    }
}

/// Codecs found in a source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCodecs {
    pub video: Vec<String>,
    pub audio: Vec<String>,
}

/// Video codecs that can be copied into MPEG-TS segments.
const COPYABLE_VIDEO: &[&str] = &["h264", "hevc"];
/// Audio codecs that can be copied into MPEG-TS segments.
const COPYABLE_AUDIO: &[&str] = &["aac", "mp3", "ac3", "eac3"];

impl SourceCodecs {
    /// Codecs that prevent a segment copy remux, empty if copy is safe.
    pub fn copy_incompatibilities(&self) -> Vec<String> {
        let video = self
            .video
            .iter()
            .filter(|c| !COPYABLE_VIDEO.contains(&c.as_str()))
            .map(|c| format!("video codec {}", c));
        let audio = self
            .audio
            .iter()
            .filter(|c| !COPYABLE_AUDIO.contains(&c.as_str()))
            .map(|c| format!("audio codec {}", c));
        video.chain(audio).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_paths() {
        let job = TranscodeJob {
            job_id: "1-a".to_string(),
            input_path: PathBuf::from("/raw/1-a.mp4"),
            output_dir: PathBuf::from("/videos/1-a"),
            duration_secs: 0.0,
            segmentation: SegmentationParams::default(),
        };
        assert_eq!(job.playlist_path(), PathBuf::from("/videos/1-a/index.m3u8"));
        assert_eq!(
            job.segment_path_pattern(),
            PathBuf::from("/videos/1-a/index%d.ts")
        );
    }

    #[test]
    fn test_copy_compatible_sources() {
        let codecs = SourceCodecs {
            video: vec!["h264".to_string()],
            audio: vec!["aac".to_string()],
        };
        assert!(codecs.copy_incompatibilities().is_empty());
    }

    #[test]
    fn test_copy_incompatible_sources() {
        let codecs = SourceCodecs {
            video: vec!["vp9".to_string()],
            audio: vec!["opus".to_string(), "aac".to_string()],
        };
        assert_eq!(
            codecs.copy_incompatibilities(),
            vec!["video codec vp9".to_string(), "audio codec opus".to_string()]
        );
    }

    #[test]
    fn test_software_profile() {
        match EncodeProfile::software(1080, "veryfast") {
            EncodeProfile::Reencode {
                max_height,
                video_codec,
                audio_codec,
                preset,
            } => {
                assert_eq!(max_height, 1080);
                assert_eq!(video_codec, "libx264");
                assert_eq!(audio_codec, "aac");
                assert_eq!(preset, "veryfast");
            }
            EncodeProfile::Copy => panic!("expected re-encode profile"),
        }
        assert!(EncodeProfile::Copy.is_copy());
    }
}
