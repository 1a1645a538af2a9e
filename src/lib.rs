pub mod api;
pub mod cli;
pub mod config;
pub mod decode;
pub mod error;
pub mod labels;
pub mod logging;
pub mod ml;
pub mod normalize;
pub mod paths;
pub mod services;

pub use config::AppConfig;
pub use error::{Result, SmartfoodError};
pub use normalize::{CaloriePrediction, ImagePrediction, ModelConfig, ScalerParams, ScoredLabel};
pub use services::{EatingPatternPredictor, FoodClassifier, HealthReport, PredictionService};
