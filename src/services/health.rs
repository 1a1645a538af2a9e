//! Health report shared by both prediction services.

use serde::{Deserialize, Serialize};

/// Health status of a prediction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
}

/// Response of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    /// Model is cached in memory.
    pub model_loaded: bool,
    /// Model artifact exists on disk right now.
    pub model_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
}

impl HealthReport {
    pub fn new(model_loaded: bool, model_available: bool, model_path: Option<String>) -> Self {
        Self {
            status: HealthStatus::Ok,
            model_loaded,
            model_available,
            model_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_wire_shape() {
        let report = HealthReport::new(false, true, None);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "ok",
                "model_loaded": false,
                "model_available": true,
            })
        );
    }
}
