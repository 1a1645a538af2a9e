pub mod classifier;
pub mod eating_pattern;
pub mod health;
pub mod prediction;

pub use classifier::FoodClassifier;
pub use eating_pattern::EatingPatternPredictor;
pub use health::{HealthReport, HealthStatus};
pub use prediction::{run_model, PredictionService};
