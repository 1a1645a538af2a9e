//! Shared command line for both service binaries.
//!
//! `<binary> <INPUT>` runs one prediction and prints the JSON result;
//! `<binary> --server` runs the HTTP surface instead.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tracing::{debug, error};

use crate::api::PredictionServer;
use crate::config::AppConfig;
use crate::error::Result;
use crate::logging::{init_logging, init_logging_simple};
use crate::paths::resolve_project_root;
use crate::services::PredictionService;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct ServiceCli {
    /// Payload for a single prediction (base64 image or sequence JSON)
    #[arg(required_unless_present = "server", conflicts_with = "server")]
    pub input: Option<String>,

    /// Run as an HTTP server instead of exiting after one prediction
    #[arg(long)]
    pub server: bool,

    /// Configuration directory
    #[arg(short, long, default_value = "config")]
    pub config: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Server,
    OneShot(String),
}

impl ServiceCli {
    pub fn mode(&self) -> Mode {
        match (&self.input, self.server) {
            (Some(input), false) => Mode::OneShot(input.clone()),
            _ => Mode::Server,
        }
    }
}

/// Entry point of a service binary.
pub async fn run<S: PredictionService>(cli: ServiceCli) -> ExitCode {
    let config = match AppConfig::load_from(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", error_json(&format!("Configuration error: {e}")));
            return ExitCode::FAILURE;
        }
    };
    if let Err(errors) = config.validate() {
        eprintln!(
            "{}",
            error_json(&format!("invalid configuration: {}", errors.join("; ")))
        );
        return ExitCode::FAILURE;
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    match cli.mode() {
        Mode::Server => {
            init_logging(&config.logging);
            let service = Arc::new(build_service::<S>(&config, &cwd));
            let server = PredictionServer::new(service, S::bind_address(&config));
            match server.run().await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!(service = S::NAME, error = %e, "server failed");
                    ExitCode::FAILURE
                }
            }
        }
        Mode::OneShot(input) => {
            init_logging_simple();
            let service = build_service::<S>(&config, &cwd);
            match predict_once(&service, &input).await {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{}", error_json(&e.to_string()));
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn build_service<S: PredictionService>(config: &AppConfig, cwd: &Path) -> S {
    let root = resolve_project_root(config, cwd);
    debug!(service = S::NAME, root = %root.display(), "resolved project root");
    S::from_config(config, &root)
}

/// One prediction from a CLI argument, serialized as a JSON line.
pub async fn predict_once<S: PredictionService>(service: &S, input: &str) -> Result<String> {
    let output = service.predict_arg(input).await?;
    Ok(serde_json::to_string(&output)?)
}

/// The `{"error": ...}` object written to stderr on failure.
pub fn error_json(message: &str) -> String {
    json!({ "error": message }).to_string()
}
