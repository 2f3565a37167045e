//! Structured logging with tracing.
//!
//! Diagnostics go to stderr; stdout is reserved for the start/finish banners
//! and rendered messages.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

#[derive(Clone, Debug)]
pub struct Logger;

impl Logger {
    /// Installs the global subscriber. `RUST_LOG` overrides the default `info`
    /// filter. Later calls are no-ops.
    pub fn init() {
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
            )
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_does_not_panic() {
        Logger::init();
        Logger::init();
        tracing::info!("logger initialised");
    }
}
