//! Catalog listing and the upload endpoint.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    Json,
};
use futures::TryStreamExt;
use segmenta_core::{PipelineError, Upload, VideoRecord};
use std::io;
use std::sync::Arc;
use tokio_util::io::StreamReader;
use tracing::{info, instrument};

use super::error::ApiError;
use crate::state::AppState;

/// Multipart field carrying the video.
pub const UPLOAD_FIELD: &str = "file";

pub async fn list_videos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VideoRecord>>, ApiError> {
    let videos = state.catalog().list().await?;
    Ok(Json(videos))
}

pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<VideoRecord>, ApiError> {
    let video = state.catalog().get(&id).await?;
    Ok(Json(video))
}

/// Accepts a multipart upload and converts it before responding.
///
/// The `file` field is streamed straight into the staging area. Other
/// fields are skipped.
#[instrument(skip_all)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<VideoRecord>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let original_name = field.file_name().map(str::to_owned);
        info!(original_name = ?original_name, "Upload received");

        let reader = StreamReader::new(field.map_err(io::Error::other));
        futures::pin_mut!(reader);

        let upload = Upload {
            original_name,
            reader,
        };
        let record = state.pipeline().run(upload).await.map_err(upload_error)?;
        return Ok(Json(record));
    }

    Err(ApiError::bad_request(format!(
        "Missing multipart field '{}'",
        UPLOAD_FIELD
    )))
}

/// Keeps the multipart status, so an oversized body answers 413.
fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::new(
        err.status(),
        format!("Malformed multipart body: {}", err.body_text()),
    )
}

/// Body errors hit while staging surface as multipart errors, not as I/O
/// failures of the server.
fn upload_error(err: PipelineError) -> ApiError {
    if let PipelineError::Staging(source) = &err {
        let multipart = source
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<MultipartError>());
        if let Some(multipart) = multipart {
            return ApiError::new(
                multipart.status(),
                format!("Upload rejected: {}", multipart.body_text()),
            );
        }
    }
    err.into()
}
