use axum::{extract::State, http::header, response::IntoResponse, Json};
use segmenta_core::{
    transcoder::EncoderCapabilities, ServerConfig, StorageConfig, TranscoderConfig,
};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Effective configuration plus what was detected at startup.
#[derive(Serialize)]
pub struct ConfigResponse {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub transcoder: TranscoderConfig,
    pub strategy: String,
    pub capabilities: EncoderCapabilities,
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    let config = state.config();
    Json(ConfigResponse {
        server: config.server.clone(),
        storage: config.storage.clone(),
        transcoder: config.transcoder.clone(),
        strategy: state.pipeline().strategy_name().to_string(),
        capabilities: state.capabilities().clone(),
    })
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
