use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::SmartfoodError;

pub use crate::services::HealthReport;

// ============================================================================
// Error Types
// ============================================================================

/// Body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Request-boundary wrapper turning any [`SmartfoodError`] into a JSON response.
#[derive(Debug)]
pub struct ApiError(pub SmartfoodError);

impl From<SmartfoodError> for ApiError {
    fn from(err: SmartfoodError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            error!(error = %self.0, "prediction failed");
        } else {
            warn!(error = %self.0, "rejected request");
        }
        (status, Json(ErrorBody::new(self.0.to_string()))).into_response()
    }
}

/// 400 with a fixed message, for request-shape problems caught in the handler.
pub fn bad_request(message: &str) -> ApiError {
    ApiError(SmartfoodError::Validation(message.to_string()))
}
