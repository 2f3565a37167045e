//! ## tickbus-cli
//! Entry point: logging, configuration, then one timed producer/consumer run.

use clap::Parser;
use tickbus_telemetry::Logger;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    Logger::init();
    let cli = Cli::parse();
    commands::run(cli).await
}
