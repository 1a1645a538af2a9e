//! Eating-pattern (calorie + food category) prediction service.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::AppConfig;
use crate::decode::{decode_sequence, decode_sequence_json, SEQUENCE_INPUT_SHAPE};
use crate::error::{Result, SmartfoodError};
use crate::ml::{InputTensor, ModelLoader, OnnxLoader, TensorModel};
use crate::normalize::{calorie_prediction, CaloriePrediction, ModelConfig, ScalerParams};
use crate::paths::EatingPatternArtifacts;
use crate::services::{run_model, HealthReport, PredictionService};

/// Model plus the two JSON companions it was trained with.
struct LoadedBundle {
    model: Arc<dyn TensorModel>,
    scaler: ScalerParams,
    config: ModelConfig,
}

pub struct EatingPatternPredictor {
    artifacts: EatingPatternArtifacts,
    loader: Arc<dyn ModelLoader>,
    bundle: OnceCell<Arc<LoadedBundle>>,
    timeout: Duration,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read(path).map_err(|e| {
        SmartfoodError::Configuration(format!("cannot read {}: {e}", path.display()))
    })?;
    serde_json::from_slice(&raw).map_err(|e| {
        SmartfoodError::Configuration(format!("cannot parse {}: {e}", path.display()))
    })
}

fn load_bundle(
    artifacts: &EatingPatternArtifacts,
    loader: &dyn ModelLoader,
) -> Result<LoadedBundle> {
    artifacts.ensure_present()?;

    let scaler: ScalerParams = read_json(&artifacts.scaler)?;
    scaler.calorie_bounds()?;
    let config: ModelConfig = read_json(&artifacts.config)?;
    if config.food_categories.is_empty() {
        return Err(SmartfoodError::Configuration(format!(
            "{} lists no food_categories",
            artifacts.config.display()
        )));
    }

    let model = loader.load(&artifacts.model, &SEQUENCE_INPUT_SHAPE)?;
    Ok(LoadedBundle {
        model,
        scaler,
        config,
    })
}

impl EatingPatternPredictor {
    pub fn new(
        artifacts: EatingPatternArtifacts,
        loader: Arc<dyn ModelLoader>,
        timeout: Duration,
    ) -> Self {
        Self {
            artifacts,
            loader,
            bundle: OnceCell::new(),
            timeout,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.bundle.initialized()
    }

    async fn bundle(&self) -> Result<Arc<LoadedBundle>> {
        self.bundle.get_or_try_init(|| self.load()).await.cloned()
    }

    async fn load(&self) -> Result<Arc<LoadedBundle>> {
        info!(path = %self.artifacts.model.display(), "loading eating-pattern model");
        let artifacts = self.artifacts.clone();
        let loader = Arc::clone(&self.loader);
        let bundle = tokio::task::spawn_blocking(move || load_bundle(&artifacts, loader.as_ref()))
            .await
            .map_err(|e| SmartfoodError::Processing(format!("model load task failed: {e}")))??;
        info!(
            categories = bundle.config.food_categories.len(),
            "eating-pattern model loaded"
        );
        Ok(Arc::new(bundle))
    }
}

#[async_trait]
impl PredictionService for EatingPatternPredictor {
    type Output = CaloriePrediction;

    const NAME: &'static str = "eating-pattern";
    const INPUT_FIELD: &'static str = "sequence";

    fn from_config(config: &AppConfig, project_root: &Path) -> Self {
        Self::new(
            EatingPatternArtifacts::resolve(project_root, &config.eating_pattern),
            Arc::new(OnnxLoader),
            Duration::from_millis(config.inference.timeout_ms),
        )
    }

    fn bind_address(config: &AppConfig) -> String {
        format!("{}:{}", config.eating_pattern.host, config.eating_pattern.port)
    }

    fn decode_field(&self, value: &Value) -> Result<InputTensor> {
        decode_sequence(value)
    }

    fn decode_arg(&self, arg: &str) -> Result<InputTensor> {
        decode_sequence_json(arg)
    }

    async fn infer(&self, input: InputTensor) -> Result<CaloriePrediction> {
        let bundle = self.bundle().await?;
        let outputs = run_model(Arc::clone(&bundle.model), input, self.timeout).await?;
        calorie_prediction(&outputs, &bundle.scaler, &bundle.config)
    }

    async fn warm_up(&self) -> Result<()> {
        self.bundle().await.map(|_| ())
    }

    fn health(&self) -> HealthReport {
        HealthReport::new(
            self.is_loaded(),
            self.artifacts.model.is_file(),
            Some(self.artifacts.model.display().to_string()),
        )
    }
}
