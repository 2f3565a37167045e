//! Prometheus counters for the producer and consumer loops.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metrics registry error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("metrics exposition is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub messages_produced: IntCounter,
    pub messages_drained: IntCounter,
    pub drain_batch_size: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();
        let messages_produced = IntCounter::new(
            "tickbus_messages_produced_total",
            "Messages appended to the shared buffer",
        )?;
        let messages_drained = IntCounter::new(
            "tickbus_messages_drained_total",
            "Messages drained from the shared buffer and printed",
        )?;
        let drain_batch_size = Histogram::with_opts(
            HistogramOpts::new("tickbus_drain_batch_size", "Messages taken per consumer tick")
                .buckets(vec![0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 64.0]),
        )?;

        registry.register(Box::new(messages_produced.clone()))?;
        registry.register(Box::new(messages_drained.clone()))?;
        registry.register(Box::new(drain_batch_size.clone()))?;

        Ok(Self {
            registry,
            messages_produced,
            messages_drained,
            drain_batch_size,
        })
    }

    #[inline]
    pub fn inc_produced(&self) {
        self.messages_produced.inc();
    }

    pub fn record_drain(&self, batch: usize) {
        self.messages_drained.inc_by(batch as u64);
        self.drain_batch_size.observe(batch as f64);
    }

    /// Prometheus text exposition of every registered metric.
    pub fn gather_metrics(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
