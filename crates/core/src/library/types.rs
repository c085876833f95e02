//! Types for the video library.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use super::playlist_url;

/// The persisted form of a completed video, as written to `metadata.json`.
///
/// Unknown fields are ignored on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredVideo {
    pub id: String,
    pub original_name: String,
    /// Captured when the upload was staged, not when it finished.
    #[serde(with = "timestamp")]
    pub uploaded_at: DateTime<Utc>,
}

/// A catalog entry as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    pub original_name: String,
    pub playlist_url: String,
    #[serde(with = "timestamp")]
    pub uploaded_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Builds the public record. The playlist URL comes from the directory
    /// name, which may differ from the stored id if the directory was renamed.
    pub fn from_stored(stored: StoredVideo, dir_name: &str, playlist_filename: &str) -> Self {
        Self {
            id: stored.id,
            original_name: stored.original_name,
            playlist_url: playlist_url(dir_name, playlist_filename),
            uploaded_at: stored.uploaded_at,
        }
    }
}

/// Errors from the metadata store and catalog reader.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("Metadata already exists at {path}")]
    AlreadyExists { path: PathBuf },

    #[error("Malformed metadata at {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// `uploadedAt` encoding: RFC 3339 UTC with milliseconds on write. Reads also
/// accept other offsets and naive ISO-8601 timestamps, taken as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn format(at: &DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        DateTime::parse_from_rfc3339(raw)
            .map(|at| at.with_timezone(&Utc))
            .ok()
            .or_else(|| raw.parse::<NaiveDateTime>().ok().map(|at| at.and_utc()))
    }

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stored_video_wire_format() {
        let video = StoredVideo {
            id: "1700000000000-myvacation".to_string(),
            original_name: "My Vacation.MOV".to_string(),
            uploaded_at: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
        };

        let json: serde_json::Value = serde_json::to_value(&video).unwrap();
        assert_eq!(json["id"], "1700000000000-myvacation");
        assert_eq!(json["originalName"], "My Vacation.MOV");
        assert_eq!(json["uploadedAt"], "2023-11-14T22:13:20.123Z");
        assert!(json.get("playlistUrl").is_none());
    }

    #[test]
    fn test_stored_video_ignores_unknown_fields() {
        let json = r#"{
            "id": "1-a",
            "originalName": "a.mp4",
            "uploadedAt": "2026-01-01T00:00:00Z",
            "extra": 42
        }"#;
        let video: StoredVideo = serde_json::from_str(json).unwrap();
        assert_eq!(video.id, "1-a");
    }

    #[test]
    fn test_timestamp_accepts_naive_and_offset_forms() {
        let expected = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(timestamp::parse("2026-01-01T12:00:00Z"), Some(expected));
        assert_eq!(timestamp::parse("2026-01-01T14:00:00+02:00"), Some(expected));
        assert_eq!(timestamp::parse("2026-01-01T12:00:00"), Some(expected));
        assert_eq!(
            timestamp::parse("2026-01-01T12:00:00.250000"),
            Some(expected + chrono::Duration::milliseconds(250))
        );
        assert_eq!(timestamp::parse("yesterday"), None);
    }

    #[test]
    fn test_record_url_follows_directory_name() {
        let stored = StoredVideo {
            id: "1-old".to_string(),
            original_name: "old.mp4".to_string(),
            uploaded_at: Utc::now(),
        };
        let record = VideoRecord::from_stored(stored, "2-renamed", "index.m3u8");
        assert_eq!(record.id, "1-old");
        assert_eq!(record.playlist_url, "/streams/2-renamed/index.m3u8");
    }
}
