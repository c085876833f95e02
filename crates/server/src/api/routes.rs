use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, jobs, middleware::metrics_middleware, streams, videos};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit =
        usize::try_from(state.config().server.max_upload_bytes).unwrap_or(usize::MAX);

    // Operational routes
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/{id}", get(jobs::get_job))
        .route("/jobs/{id}", delete(jobs::cancel_job));

    Router::new()
        // Catalog and uploads
        .route("/videos", get(videos::list_videos).post(videos::upload_video))
        .route("/videos/{id}", get(videos::get_video))
        // HLS output
        .route("/streams/{video_id}/{filename}", get(streams::serve_stream_file))
        .route("/metrics", get(handlers::metrics))
        .nest("/api/v1", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
