//! Food-101 image classifier service.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::AppConfig;
use crate::decode::{decode_image, IMAGE_INPUT_SHAPE};
use crate::error::{Result, SmartfoodError};
use crate::labels::FOOD_CLASSES;
use crate::ml::{InputTensor, ModelLoader, OnnxLoader, TensorModel};
use crate::normalize::{classify, ImagePrediction};
use crate::paths::{classifier_artifact, ArtifactLocation};
use crate::services::{run_model, HealthReport, PredictionService};

pub struct FoodClassifier {
    location: ArtifactLocation,
    loader: Arc<dyn ModelLoader>,
    model: OnceCell<Arc<dyn TensorModel>>,
    timeout: Duration,
}

impl FoodClassifier {
    pub fn new(location: ArtifactLocation, loader: Arc<dyn ModelLoader>, timeout: Duration) -> Self {
        Self {
            location,
            loader,
            model: OnceCell::new(),
            timeout,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    async fn model(&self) -> Result<Arc<dyn TensorModel>> {
        self.model.get_or_try_init(|| self.load_model()).await.cloned()
    }

    async fn load_model(&self) -> Result<Arc<dyn TensorModel>> {
        let path = self.location.find().ok_or_else(|| {
            let expected = self
                .location
                .expected()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<no candidate directories>".to_string());
            SmartfoodError::Configuration(format!("CNN model not found. Expected at: {expected}"))
        })?;

        info!(path = %path.display(), "loading food classifier model");
        let loader = Arc::clone(&self.loader);
        tokio::task::spawn_blocking(move || loader.load(&path, &IMAGE_INPUT_SHAPE))
            .await
            .map_err(|e| SmartfoodError::Processing(format!("model load task failed: {e}")))?
    }
}

#[async_trait]
impl PredictionService for FoodClassifier {
    type Output = ImagePrediction;

    const NAME: &'static str = "food-classifier";
    const INPUT_FIELD: &'static str = "image";

    fn from_config(config: &AppConfig, project_root: &Path) -> Self {
        Self::new(
            classifier_artifact(project_root, &config.classifier),
            Arc::new(OnnxLoader),
            Duration::from_millis(config.inference.timeout_ms),
        )
    }

    fn bind_address(config: &AppConfig) -> String {
        format!("{}:{}", config.classifier.host, config.classifier.port)
    }

    fn decode_field(&self, value: &Value) -> Result<InputTensor> {
        let encoded = value.as_str().ok_or_else(|| {
            SmartfoodError::Validation("image must be a base64-encoded string".to_string())
        })?;
        decode_image(encoded)
    }

    fn decode_arg(&self, arg: &str) -> Result<InputTensor> {
        decode_image(arg)
    }

    async fn infer(&self, input: InputTensor) -> Result<ImagePrediction> {
        let model = self.model().await?;
        let outputs = run_model(model, input, self.timeout).await?;
        let scores = outputs.first().ok_or_else(|| {
            SmartfoodError::InternalInconsistency("classifier produced no outputs".to_string())
        })?;
        classify(scores, &FOOD_CLASSES)
    }

    async fn warm_up(&self) -> Result<()> {
        self.model().await.map(|_| ())
    }

    fn health(&self) -> HealthReport {
        HealthReport::new(
            self.is_loaded(),
            self.location.is_available(),
            self.location.expected().map(|p| p.display().to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::NUM_CLASSES;
    use crate::ml::{MockModelLoader, MockTensorModel};
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use std::io::Cursor;

    fn artifact_in(dir: &Path) -> ArtifactLocation {
        let path = dir.join("food_classifier_best.onnx");
        std::fs::write(&path, b"onnx").unwrap();
        ArtifactLocation::new(vec![path])
    }

    fn tiny_png() -> String {
        let img = image::RgbImage::from_pixel(3, 5, image::Rgb([10, 200, 30]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::from(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        BASE64.encode(buf.into_inner())
    }

    fn scores_peaking_at(idx: usize) -> Vec<f32> {
        let mut scores = vec![0.001_f32; NUM_CLASSES];
        scores[idx] = 0.8;
        scores
    }

    #[tokio::test]
    async fn predicts_and_loads_once() {
        let tmp = tempfile::tempdir().unwrap();
        let mut loader = MockModelLoader::new();
        loader.expect_load().times(1).returning(|_, shape| {
            assert_eq!(shape, &IMAGE_INPUT_SHAPE);
            let mut model = MockTensorModel::new();
            model
                .expect_run()
                .returning(|_| Ok(vec![scores_peaking_at(76)]));
            Ok(Arc::new(model) as Arc<dyn TensorModel>)
        });

        let service = FoodClassifier::new(
            artifact_in(tmp.path()),
            Arc::new(loader),
            Duration::from_secs(5),
        );
        assert!(!service.health().model_loaded);

        let payload = Value::String(tiny_png());
        for _ in 0..2 {
            let pred = service.predict(&payload).await.unwrap();
            assert_eq!(pred.class, "pizza");
            assert_eq!(pred.confidence, 0.8);
            assert_eq!(pred.top_5.len(), 5);
        }
        assert!(service.health().model_loaded);
    }

    #[tokio::test]
    async fn missing_artifact_is_a_configuration_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut loader = MockModelLoader::new();
        loader.expect_load().times(0);

        let expected = tmp.path().join("absent.onnx");
        let service = FoodClassifier::new(
            ArtifactLocation::new(vec![expected.clone()]),
            Arc::new(loader),
            Duration::from_secs(5),
        );

        let err = service.warm_up().await.unwrap_err();
        assert!(matches!(err, SmartfoodError::Configuration(_)));
        assert!(err.to_string().contains("absent.onnx"));

        let health = service.health();
        assert!(!health.model_available);
        assert!(!health.model_loaded);
        assert_eq!(health.model_path, Some(expected.display().to_string()));
    }

    #[tokio::test]
    async fn bad_payload_never_reaches_the_model() {
        let tmp = tempfile::tempdir().unwrap();
        let mut loader = MockModelLoader::new();
        loader.expect_load().times(0);
        let service = FoodClassifier::new(
            artifact_in(tmp.path()),
            Arc::new(loader),
            Duration::from_secs(5),
        );

        let err = service.predict(&serde_json::json!(42)).await.unwrap_err();
        assert!(matches!(err, SmartfoodError::Validation(_)));

        let err = service.predict_arg("%%%not-base64%%%").await.unwrap_err();
        assert!(matches!(err, SmartfoodError::Decode(_)));
    }

    #[tokio::test]
    async fn health_tracks_artifact_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("food_classifier_best.onnx");
        let service = FoodClassifier::new(
            ArtifactLocation::new(vec![path.clone()]),
            Arc::new(MockModelLoader::new()),
            Duration::from_secs(5),
        );
        assert!(!service.health().model_available);

        std::fs::write(&path, b"onnx").unwrap();
        assert!(service.health().model_available);
    }
}
