//! HTTP router construction.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api;
use crate::state::AppState;

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/validate", post(api::validate))
        .route("/api/schemas", get(api::schemas_list))
        .route("/api/schemas/reload", post(api::schemas_reload))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
