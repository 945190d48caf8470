pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/analyses", post(handlers::handle_analyze))
        // Runs a fresh analysis and returns it as a download.
        .route(
            "/api/v1/analyses/report",
            post(handlers::handle_download_report),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
