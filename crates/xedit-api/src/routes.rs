//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{editor_schema, health, predict, ready, reset, serve_file, upload_image};
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/schema", get(editor_schema))
        .route("/upload", post(upload_image))
        .route("/predict", post(predict))
        .route("/reset", post(reset));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // `/<route>=<path>` targets produced by the file rewriter
    let file_routes = Router::new().route("/*reference", get(serve_file));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(file_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
