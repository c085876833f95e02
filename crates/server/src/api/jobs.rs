//! In-flight conversion jobs.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use segmenta_core::ActiveJob;
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use crate::state::AppState;

pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Vec<ActiveJob>> {
    Json(state.tracker().list())
}

pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ActiveJob>, ApiError> {
    state
        .tracker()
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Job not found: {}", id)))
}

/// Requests cancellation. The upload request that owns the job answers 409.
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.tracker().cancel(&id) {
        info!(job_id = %id, "Cancellation requested");
        Ok(StatusCode::ACCEPTED)
    } else {
        Err(ApiError::not_found(format!("Job not found: {}", id)))
    }
}
