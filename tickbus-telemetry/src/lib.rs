//! # Tickbus Telemetry
//!
//! Crate for logging and metrics.

pub mod logging;
pub mod metrics;

pub use logging::Logger;
pub use metrics::{MetricsError, MetricsRecorder};
