//! Calorie and food-category prediction from a 14-step eating history.
//!
//! Usage:
//!     eating-pattern '<SEQUENCE_JSON>'
//!     eating-pattern --server

use std::process::ExitCode;

use clap::Parser;
use smartfood::cli::{self, ServiceCli};
use smartfood::services::EatingPatternPredictor;

#[tokio::main]
async fn main() -> ExitCode {
    cli::run::<EatingPatternPredictor>(ServiceCli::parse()).await
}
