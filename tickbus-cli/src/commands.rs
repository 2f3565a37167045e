use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tickbus_config::{ConfigLoader, Overrides};
use tickbus_engine::Runtime;
use tickbus_telemetry::MetricsRecorder;
use tracing::info;

/// Periodic producer/consumer over a shared buffer.
///
/// Settings come from `.env`, then `SEND_INTERVAL`, `READ_INTERVAL` and
/// `TIMEOUT` in the environment, then these flags.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Producer period in seconds
    #[arg(long, allow_negative_numbers = true)]
    pub send_interval: Option<i64>,

    /// Consumer period in seconds
    #[arg(long, allow_negative_numbers = true)]
    pub read_interval: Option<i64>,

    /// Total run time in seconds
    #[arg(long, allow_negative_numbers = true)]
    pub timeout: Option<i64>,

    /// Env file to read instead of `.env`
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Write Prometheus metrics to stderr after shutdown
    #[arg(long)]
    pub metrics: bool,
}

impl Cli {
    fn loader(&self) -> ConfigLoader {
        let loader = ConfigLoader::new().with_overrides(Overrides {
            send_interval: self.send_interval,
            read_interval: self.read_interval,
            timeout: self.timeout,
        });
        match &self.env_file {
            Some(path) => loader.with_env_file(path.clone()),
            None => loader,
        }
    }
}

pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let load = cli.loader().load();
    load.log();

    let metrics = Arc::new(MetricsRecorder::new()?);
    let runtime = Runtime::new(load.config, Arc::clone(&metrics));
    let summary = runtime.run().await?;

    if summary.buffer.resident > 0 {
        info!(
            unprinted = summary.buffer.resident,
            "messages produced after the last drain were not printed"
        );
    }
    if cli.metrics {
        eprint!("{}", metrics.gather_metrics()?);
    }
    Ok(())
}
