use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::{Result, SmartfoodError};
use crate::ml::{InputTensor, TensorModel};
use crate::services::HealthReport;

/// One inference microservice: decoder, lazily loaded model, normalizer.
#[async_trait]
pub trait PredictionService: Send + Sync + 'static {
    type Output: Serialize + Send + 'static;

    /// Service name used in logs.
    const NAME: &'static str;
    /// Field of the `/predict` JSON body carrying the payload.
    const INPUT_FIELD: &'static str;

    fn from_config(config: &AppConfig, project_root: &Path) -> Self;

    /// `host:port` the HTTP surface binds to.
    fn bind_address(config: &AppConfig) -> String;

    /// Decode the request field value.
    fn decode_field(&self, value: &Value) -> Result<InputTensor>;

    /// Decode the one-shot CLI argument.
    fn decode_arg(&self, arg: &str) -> Result<InputTensor>;

    /// Run the model and normalize its outputs.
    async fn infer(&self, input: InputTensor) -> Result<Self::Output>;

    /// Load the model now instead of on first request.
    async fn warm_up(&self) -> Result<()>;

    fn health(&self) -> HealthReport;

    async fn predict(&self, value: &Value) -> Result<Self::Output> {
        let input = self.decode_field(value)?;
        self.infer(input).await
    }

    async fn predict_arg(&self, arg: &str) -> Result<Self::Output> {
        let input = self.decode_arg(arg)?;
        self.infer(input).await
    }
}

/// Run `model` on the blocking pool, giving up after `timeout`.
///
/// A timed-out forward pass keeps running on its blocking thread; only the
/// request is released.
pub async fn run_model(
    model: Arc<dyn TensorModel>,
    input: InputTensor,
    timeout: Duration,
) -> Result<Vec<Vec<f32>>> {
    let task = tokio::task::spawn_blocking(move || model.run(&input));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(outputs)) => outputs,
        Ok(Err(e)) => Err(SmartfoodError::Processing(format!(
            "inference task failed: {e}"
        ))),
        Err(_) => Err(SmartfoodError::Processing(format!(
            "model invocation timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}
