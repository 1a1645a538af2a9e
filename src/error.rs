use axum::http::StatusCode;
use thiserror::Error;

/// Main error type for the inference services
#[derive(Error, Debug)]
pub enum SmartfoodError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Model artifact or companion file absent or unusable.
    #[error("{0}")]
    Configuration(String),

    // Request errors
    #[error("{0}")]
    Validation(String),

    /// Request body over the configured size limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Failed to preprocess image: {0}")]
    Decode(String),

    // Inference errors
    #[error("Prediction failed: {0}")]
    Processing(String),

    /// Model output and label tables disagree; never clamped.
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SmartfoodError {
    /// HTTP status reported for this error at the request boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SmartfoodError::Validation(_) => StatusCode::BAD_REQUEST,
            SmartfoodError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Result type alias for SmartfoodError
pub type Result<T> = std::result::Result<T, SmartfoodError>;
