use std::sync::Arc;

use axum::{extract::State, Json};

use crate::api::types::HealthReport;
use crate::services::PredictionService;

/// GET /health -- whether the model artifact exists and whether it is loaded
pub async fn health_handler<S: PredictionService>(
    State(service): State<Arc<S>>,
) -> Json<HealthReport> {
    Json(service.health())
}
