use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::api::types::{bad_request, ApiError};
use crate::error::SmartfoodError;
use crate::services::PredictionService;

/// Absent, `null`, `false` and empty values all count as "missing".
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// POST /predict
///
/// Malformed or non-object JSON is a 400 "No JSON data provided", never an
/// extractor rejection. A body over the size limit is a JSON 413.
pub async fn predict_handler<S: PredictionService>(
    State(service): State<Arc<S>>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<Json<S::Output>, ApiError> {
    let body = body.map_err(body_rejection)?;
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let fields = match &payload {
        Value::Object(map) if !map.is_empty() => map,
        _ => return Err(bad_request("No JSON data provided")),
    };

    let field = fields
        .get(S::INPUT_FIELD)
        .filter(|v| !is_blank(v))
        .ok_or_else(|| {
            ApiError(SmartfoodError::Validation(format!(
                "Missing {}",
                S::INPUT_FIELD
            )))
        })?;

    let output = service.predict(field).await?;
    Ok(Json(output))
}

fn body_rejection(rejection: BytesRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError(SmartfoodError::PayloadTooLarge(rejection.body_text()))
    } else {
        bad_request("No JSON data provided")
    }
}
