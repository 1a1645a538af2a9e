//! Food-101 image classifier.
//!
//! Usage:
//!     food-classifier <IMAGE_BASE64>
//!     food-classifier --server

use std::process::ExitCode;

use clap::Parser;
use smartfood::cli::{self, ServiceCli};
use smartfood::services::FoodClassifier;

#[tokio::main]
async fn main() -> ExitCode {
    cli::run::<FoodClassifier>(ServiceCli::parse()).await
}
