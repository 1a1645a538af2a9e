use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::handlers;
use crate::services::PredictionService;

/// Base64 photos from phones routinely exceed axum's 2 MiB default.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub fn create_router<S: PredictionService>(service: Arc<S>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/predict", post(handlers::predict_handler::<S>))
        .route("/health", get(handlers::health_handler::<S>))
        .with_state(service)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
}
