use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Explicit project root; discovered from the working directory when unset
    #[serde(default)]
    pub project_root: Option<PathBuf>,
    pub classifier: ClassifierConfig,
    pub eating_pattern: EatingPatternConfig,
    pub inference: InferenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub host: String,
    pub port: u16,
    /// Model file name looked up in each of `model_dirs`
    pub model_file: String,
    /// Candidate directories relative to the project root, in search order
    pub model_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EatingPatternConfig {
    pub host: String,
    pub port: u16,
    /// Directory relative to the project root holding all three artifacts
    pub model_dir: PathBuf,
    pub model_file: String,
    pub scaler_file: String,
    pub config_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    /// Upper bound for a single model invocation in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("classifier.host", "127.0.0.1")?
            .set_default("classifier.port", 5001)?
            .set_default("classifier.model_file", "food_classifier_best.onnx")?
            .set_default(
                "classifier.model_dirs",
                vec!["data/models/cnn", "notebooks/data/models/cnn"],
            )?
            .set_default("eating_pattern.host", "127.0.0.1")?
            .set_default("eating_pattern.port", 5000)?
            .set_default("eating_pattern.model_dir", "data/models/lstm")?
            .set_default("eating_pattern.model_file", "eating_pattern_model.onnx")?
            .set_default("eating_pattern.scaler_file", "scaler_params.json")?
            .set_default("eating_pattern.config_file", "model_config.json")?
            .set_default("inference.timeout_ms", default_timeout_ms())?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("SMARTFOOD_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (SMARTFOOD_CLASSIFIER__PORT, etc.)
            .add_source(
                Environment::with_prefix("SMARTFOOD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Create a default configuration without touching files or environment
    pub fn default_config() -> Self {
        Self {
            project_root: None,
            classifier: ClassifierConfig {
                host: "127.0.0.1".to_string(),
                port: 5001,
                model_file: "food_classifier_best.onnx".to_string(),
                model_dirs: vec![
                    PathBuf::from("data/models/cnn"),
                    PathBuf::from("notebooks/data/models/cnn"),
                ],
            },
            eating_pattern: EatingPatternConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                model_dir: PathBuf::from("data/models/lstm"),
                model_file: "eating_pattern_model.onnx".to_string(),
                scaler_file: "scaler_params.json".to_string(),
                config_file: "model_config.json".to_string(),
            },
            inference: InferenceConfig {
                timeout_ms: default_timeout_ms(),
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.classifier.port == 0 {
            errors.push("classifier.port must be non-zero".to_string());
        }
        if self.eating_pattern.port == 0 {
            errors.push("eating_pattern.port must be non-zero".to_string());
        }

        if self.classifier.model_file.trim().is_empty() {
            errors.push("classifier.model_file must not be empty".to_string());
        }
        if self.classifier.model_dirs.is_empty() {
            errors.push("classifier.model_dirs needs at least one directory".to_string());
        }

        for (name, value) in [
            ("eating_pattern.model_file", &self.eating_pattern.model_file),
            ("eating_pattern.scaler_file", &self.eating_pattern.scaler_file),
            ("eating_pattern.config_file", &self.eating_pattern.config_file),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{name} must not be empty"));
            }
        }

        if self.inference.timeout_ms == 0 {
            errors.push("inference.timeout_ms must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
