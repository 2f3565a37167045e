//! Lifecycle controller: starts both loops against one buffer and one deadline,
//! then waits for both to stop.

use std::sync::Arc;
use std::time::Duration;

use tickbus_config::TickbusConfig;
use tickbus_core::{capacity_hint, instant_after, BufferStats, Deadline, SharedBuffer};
use tickbus_telemetry::MetricsRecorder;
use tokio::time::{interval_at, Interval, MissedTickBehavior};
use tracing::{debug, info, instrument};

use crate::consumer::{Consumer, MessageSink, StdoutSink};
use crate::error::RuntimeError;
use crate::producer::Producer;

pub const START_BANNER: &str = "Start!";
pub const FINISH_BANNER: &str = "Finish!";

/// Loop lifecycle. `Stopped` is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopState {
    #[default]
    Running,
    Stopped,
}

/// What a loop reports back once it has stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopReport {
    pub state: LoopState,
    /// Timer fires handled before the deadline.
    pub ticks: u64,
    /// Messages appended (producer) or drained (consumer).
    pub messages: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub producer: LoopReport,
    pub consumer: LoopReport,
    /// Buffer counters after both loops stopped. `resident` messages were
    /// never printed.
    pub buffer: BufferStats,
}

/// Ticker whose first tick fires one full `period` from now.
pub(crate) fn periodic(period: Duration) -> Interval {
    let mut ticker = interval_at(instant_after(period), period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

pub struct Runtime {
    config: TickbusConfig,
    buffer: Arc<SharedBuffer>,
    metrics: Arc<MetricsRecorder>,
}

impl Runtime {
    pub fn new(config: TickbusConfig, metrics: Arc<MetricsRecorder>) -> Self {
        let hint = capacity_hint(config.send_interval, config.read_interval);
        debug!(capacity_hint = hint, "allocating shared buffer");

        Self {
            config,
            buffer: Arc::new(SharedBuffer::with_capacity(hint)),
            metrics,
        }
    }

    pub fn buffer(&self) -> &Arc<SharedBuffer> {
        &self.buffer
    }

    /// Runs until the configured timeout, printing drained messages to stdout.
    pub async fn run(&self) -> Result<RunSummary, RuntimeError> {
        self.run_with_sink(StdoutSink).await
    }

    /// Prints the start banner, runs both loops on separate tasks until the
    /// deadline, joins them and prints the finish banner.
    #[instrument(name = "runtime", skip_all, fields(timeout = ?self.config.timeout))]
    pub async fn run_with_sink<S>(&self, sink: S) -> Result<RunSummary, RuntimeError>
    where
        S: MessageSink + 'static,
    {
        let deadline = Deadline::after(self.config.timeout);

        println!("{START_BANNER}");
        info!("starting producer and consumer loops");

        let producer = tokio::spawn(
            Producer::new(
                Arc::clone(&self.buffer),
                self.config.send_interval,
                Arc::clone(&self.metrics),
            )
            .run(deadline.clone()),
        );
        let consumer = tokio::spawn(
            Consumer::new(
                Arc::clone(&self.buffer),
                self.config.read_interval,
                sink,
                Arc::clone(&self.metrics),
            )
            .run(deadline),
        );

        let (producer, consumer) = tokio::join!(producer, consumer);
        let producer = producer.map_err(|source| RuntimeError::Join {
            task: "producer",
            source,
        })?;
        let consumer = consumer.map_err(|source| RuntimeError::Join {
            task: "consumer",
            source,
        })?;

        let buffer = self.buffer.stats();
        info!(
            produced = producer.messages,
            printed = consumer.messages,
            unprinted = buffer.resident,
            "both loops stopped"
        );
        println!("{FINISH_BANNER}");

        Ok(RunSummary {
            producer,
            consumer,
            buffer,
        })
    }
}
