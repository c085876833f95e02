//! Transcoding of staged uploads into HLS renditions.
//!
//! Two strategies exist, chosen once at startup by [`select_strategy`]:
//!
//! - [`SoftwareTranscoder`] re-encodes to H.264/AAC, height capped at
//!   `max_height`.
//! - [`AcceleratedTranscoder`] remuxes with stream copy on hosts with an
//!   NVENC-capable ffmpeg, after checking the source codecs fit MPEG-TS.
//!
//! Both drive ffmpeg through [`FfmpegRunner`], which reads the `-progress`
//! side channel and reports percentages against the probed duration.

mod accelerated;
mod capabilities;
mod config;
mod error;
mod ffmpeg;
mod probe;
mod progress;
mod select;
mod software;
mod traits;
mod types;

pub use accelerated::{AcceleratedTranscoder, FALLBACK_STRATEGY_LABEL};
pub use capabilities::{AcceleratorInfo, EncoderCapabilities};
pub use config::{TranscoderConfig, TranscoderMode};
pub use error::{ProbeError, TranscodeError};
pub use ffmpeg::FfmpegRunner;
pub use probe::FfprobeProber;
pub use progress::{parse_line, percent_of, ProgressLine, ProgressTracker};
pub use select::{choose_strategy, select_default_strategy, select_strategy, StrategyKind};
pub use software::SoftwareTranscoder;
pub use traits::{MediaProber, TranscoderStrategy};
pub use types::{
    EncodeProfile, SegmentationParams, SourceCodecs, TranscodeJob, TranscodeOutcome,
    TranscodeProgress, SEGMENT_FILENAME_PATTERN,
};
