//! Consumer loop: drains the shared buffer every tick and hands the batch to
//! a [`MessageSink`].

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use tickbus_core::{Deadline, Message, SharedBuffer};
use tickbus_telemetry::MetricsRecorder;
use tracing::{debug, instrument, warn};

use crate::runtime::{periodic, LoopReport, LoopState};

/// Destination for drained batches.
pub trait MessageSink: Send {
    /// Receives one drained batch in insertion order. May be empty.
    fn emit(&mut self, batch: &[Message]);
}

impl<F> MessageSink for F
where
    F: FnMut(&[Message]) + Send,
{
    fn emit(&mut self, batch: &[Message]) {
        self(batch)
    }
}

/// Prints each message on its own line to stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutSink;

impl MessageSink for StdoutSink {
    fn emit(&mut self, batch: &[Message]) {
        write_batch(&mut io::stdout().lock(), batch);
    }
}

fn write_batch<W: Write>(out: &mut W, batch: &[Message]) {
    for message in batch {
        if let Err(err) = writeln!(out, "{message}") {
            warn!("failed to write message to stdout: {err}");
            return;
        }
    }
    if let Err(err) = out.flush() {
        warn!("failed to flush stdout: {err}");
    }
}

pub struct Consumer<S> {
    buffer: Arc<SharedBuffer>,
    period: Duration,
    sink: S,
    metrics: Arc<MetricsRecorder>,
}

impl<S: MessageSink> Consumer<S> {
    pub fn new(
        buffer: Arc<SharedBuffer>,
        period: Duration,
        sink: S,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            buffer,
            period,
            sink,
            metrics,
        }
    }

    /// Drains the buffer every `period` until `deadline` expires.
    ///
    /// Messages still buffered when the deadline fires are left in place.
    ///
    /// # Panics
    /// If `period` is zero.
    #[instrument(name = "consumer", skip_all, fields(period = ?self.period))]
    pub async fn run(mut self, deadline: Deadline) -> LoopReport {
        let mut ticker = periodic(self.period);
        let mut report = LoopReport::default();
        debug!("consumer started");

        while report.state == LoopState::Running {
            tokio::select! {
                biased;
                _ = deadline.expired() => report.state = LoopState::Stopped,
                _ = ticker.tick() => {
                    let batch = self.buffer.drain_all();
                    debug!(drained = batch.len(), "buffer drained");
                    self.metrics.record_drain(batch.len());
                    self.sink.emit(&batch);
                    report.ticks += 1;
                    report.messages += batch.len() as u64;
                }
            }
        }

        drop(ticker);
        debug!(ticks = report.ticks, messages = report.messages, "consumer stopped");
        report
    }
}
