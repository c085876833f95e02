//! Static delivery of the HLS output tree.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use segmenta_core::library::is_safe_component;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use super::error::ApiError;
use crate::state::AppState;

pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
pub const SEGMENT_CONTENT_TYPE: &str = "video/MP2T";

/// Playlists are matched on extension, case-insensitively. Everything
/// else in a video directory is served as a transport stream.
pub fn content_type_for(filename: &str) -> &'static str {
    let is_playlist = std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("m3u8"));

    if is_playlist {
        PLAYLIST_CONTENT_TYPE
    } else {
        SEGMENT_CONTENT_TYPE
    }
}

pub async fn serve_stream_file(
    State(state): State<Arc<AppState>>,
    Path((video_id, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    if !is_safe_component(&video_id) || !is_safe_component(&filename) {
        return Err(ApiError::not_found("Stream file not found"));
    }

    let path = state
        .config()
        .storage
        .output_root
        .join(&video_id)
        .join(&filename);

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::not_found("Stream file not found"));
        }
        Err(e) => return Err(ApiError::internal(e.to_string())),
    };

    let metadata = file
        .metadata()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if !metadata.is_file() {
        return Err(ApiError::not_found("Stream file not found"));
    }

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
            (header::CONTENT_LENGTH, metadata.len().to_string()),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for_playlist() {
        assert_eq!(content_type_for("index.m3u8"), PLAYLIST_CONTENT_TYPE);
        assert_eq!(content_type_for("INDEX.M3U8"), PLAYLIST_CONTENT_TYPE);
    }

    #[test]
    fn test_content_type_for_everything_else() {
        assert_eq!(content_type_for("index0.ts"), SEGMENT_CONTENT_TYPE);
        assert_eq!(content_type_for("metadata.json"), SEGMENT_CONTENT_TYPE);
        assert_eq!(content_type_for("m3u8"), SEGMENT_CONTENT_TYPE);
    }
}
