//! Producer loop: appends one timestamped message per tick.

use std::sync::Arc;
use std::time::Duration;

use tickbus_core::{Deadline, Message, SharedBuffer};
use tickbus_telemetry::MetricsRecorder;
use tracing::{debug, instrument, trace};

use crate::runtime::{periodic, LoopReport, LoopState};

pub struct Producer {
    buffer: Arc<SharedBuffer>,
    period: Duration,
    metrics: Arc<MetricsRecorder>,
}

impl Producer {
    pub fn new(buffer: Arc<SharedBuffer>, period: Duration, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            buffer,
            period,
            metrics,
        }
    }

    /// Appends a message every `period` until `deadline` expires.
    ///
    /// The first tick fires one full period after the call.
    ///
    /// # Panics
    /// If `period` is zero.
    #[instrument(name = "producer", skip_all, fields(period = ?self.period))]
    pub async fn run(self, deadline: Deadline) -> LoopReport {
        let mut ticker = periodic(self.period);
        let mut report = LoopReport::default();
        debug!("producer started");

        while report.state == LoopState::Running {
            tokio::select! {
                biased;
                _ = deadline.expired() => report.state = LoopState::Stopped,
                _ = ticker.tick() => {
                    self.buffer.append(Message::now());
                    self.metrics.inc_produced();
                    report.ticks += 1;
                    report.messages += 1;
                    trace!(tick = report.ticks, "message produced");
                }
            }
        }

        drop(ticker);
        debug!(ticks = report.ticks, "producer stopped");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn producer(buffer: &Arc<SharedBuffer>, secs: u64) -> Producer {
        Producer::new(
            Arc::clone(buffer),
            Duration::from_secs(secs),
            Arc::new(MetricsRecorder::new().unwrap()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn appends_once_per_period() {
        let buffer = Arc::new(SharedBuffer::with_capacity(3));
        let report = producer(&buffer, 2)
            .run(Deadline::after(Duration::from_secs(7)))
            .await;

        assert_eq!(report.state, LoopState::Stopped);
        assert_eq!(report.ticks, 3);
        assert_eq!(buffer.len(), 3);

        let drained = buffer.drain_all();
        assert!(drained
            .windows(2)
            .all(|pair| pair[0].timestamp() <= pair[1].timestamp()));
        assert!(drained.iter().all(|m| m.text() == "Message"));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_before_first_tick_produces_nothing() {
        let buffer = Arc::new(SharedBuffer::with_capacity(3));
        let report = producer(&buffer, 5)
            .run(Deadline::after(Duration::from_secs(4)))
            .await;

        assert_eq!(report.ticks, 0);
        assert!(buffer.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn counts_into_metrics() {
        let buffer = Arc::new(SharedBuffer::with_capacity(3));
        let metrics = Arc::new(MetricsRecorder::new().unwrap());
        Producer::new(Arc::clone(&buffer), Duration::from_secs(1), Arc::clone(&metrics))
            .run(Deadline::after(Duration::from_millis(4500)))
            .await;

        assert_eq!(metrics.messages_produced.get(), 4);
    }
}
