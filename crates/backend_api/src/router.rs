use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{self, AppState};

/// Create the main application router with all API endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Dashboard data
        .route("/api/owners/:owner/summary", get(handlers::get_summary))
        .route("/api/owners/:owner/charts", post(handlers::export_charts))
        // Record entry
        .route("/api/owners/:owner/sections", post(handlers::save_section))
        .route("/api/owners/:owner/entries", post(handlers::save_entry))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
