//! Parsing of ffmpeg's `-progress` side channel.
//!
//! With `-progress pipe:2` ffmpeg writes `key=value` lines to stderr, one
//! block per update. `out_time_ms` and `out_time_us` both carry the media time
//! processed so far in microseconds (the `_ms` name is historical).

use once_cell::sync::Lazy;
use regex_lite::Regex;

static ELAPSED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^out_time_(?:ms|us)=(.*)$").expect("progress regex is valid")
});

/// Keys ffmpeg emits on the progress channel.
const PROGRESS_KEYS: &[&str] = &[
    "frame",
    "fps",
    "stream_",
    "bitrate",
    "total_size",
    "out_time",
    "dup_frames",
    "drop_frames",
    "speed",
    "progress",
];

/// What a single side-channel line carried.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressLine {
    /// Elapsed media time in microseconds.
    Elapsed(u64),
    /// An elapsed-time key whose value isn't a number (e.g. `N/A`).
    Malformed(String),
    /// Any other progress key.
    OtherKey,
    /// Not a progress line; real diagnostic output.
    Diagnostic,
}

/// Classifies one line from the transcoder's diagnostic stream.
pub fn parse_line(line: &str) -> ProgressLine {
    let line = line.trim();
    if let Some(caps) = ELAPSED_LINE.captures(line) {
        let value = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        return match value.parse::<u64>() {
            Ok(us) => ProgressLine::Elapsed(us),
            Err(_) => ProgressLine::Malformed(value.to_string()),
        };
    }

    match line.split_once('=') {
        Some((key, _)) if PROGRESS_KEYS.iter().any(|k| key.starts_with(k)) => {
            ProgressLine::OtherKey
        }
        _ => ProgressLine::Diagnostic,
    }
}

/// Percentage of `duration_secs` covered by `elapsed_us`, clamped to `[0, 100]`.
///
/// Returns `None` when the duration is unknown (zero, negative or not finite),
/// so callers skip progress instead of dividing by zero.
pub fn percent_of(elapsed_us: u64, duration_secs: f64) -> Option<f32> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return None;
    }
    let percent = elapsed_us as f64 / (duration_secs * 1_000_000.0) * 100.0;
    Some(percent.clamp(0.0, 100.0) as f32)
}

/// Turns elapsed-time readings into non-decreasing percentages.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    duration_secs: f64,
    last_percent: Option<f32>,
}

impl ProgressTracker {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            last_percent: None,
        }
    }

    /// Records an elapsed reading. Returns the new percentage when it moved
    /// forward, `None` when it didn't or when the duration is unknown.
    pub fn observe(&mut self, elapsed_us: u64) -> Option<f32> {
        let percent = percent_of(elapsed_us, self.duration_secs)?;
        match self.last_percent {
            Some(last) if percent <= last => None,
            _ => {
                self.last_percent = Some(percent);
                Some(percent)
            }
        }
    }

    pub fn last_percent(&self) -> Option<f32> {
        self.last_percent
    }
}
