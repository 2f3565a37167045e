//! Shared message buffer between the producer and consumer loops.
//!
//! A single `parking_lot::Mutex` guards the message sequence together with its
//! running counters, so every append and every drain is observed whole:
//! - `append` pushes one message at the tail
//! - `drain_all` hands back everything buffered and leaves the buffer empty
//!
//! Capacity is only a hint derived from the tick periods; the buffer grows past
//! it freely.

use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use crate::message::Message;

/// Upper bound on the pre-allocated message slots.
pub const MAX_CAPACITY_HINT: usize = 1024;

/// Expected number of messages between two drains, plus one.
///
/// `round(read / send) + 1`, rounding half away from zero, clamped to
/// [`MAX_CAPACITY_HINT`]. A zero `send` period yields a hint of one.
pub fn capacity_hint(send: Duration, read: Duration) -> usize {
    if send.is_zero() {
        return 1;
    }
    let ratio = read.as_secs_f64() / send.as_secs_f64();
    (ratio.round() as usize)
        .saturating_add(1)
        .min(MAX_CAPACITY_HINT)
}

/// Counters observed together with the buffer contents under the lock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferStats {
    /// Messages ever appended.
    pub appended: u64,
    /// Messages ever handed out by `drain_all`.
    pub drained: u64,
    /// Messages currently held.
    pub resident: usize,
}

impl BufferStats {
    /// Every appended message is either drained or still resident.
    pub fn is_balanced(&self) -> bool {
        self.appended == self.drained + self.resident as u64
    }
}

struct Inner {
    messages: Vec<Message>,
    appended: u64,
    drained: u64,
}

/// Ordered, mutex-protected message store shared by both loops.
pub struct SharedBuffer {
    inner: Mutex<Inner>,
    capacity_hint: usize,
}

impl SharedBuffer {
    /// Creates an empty buffer pre-sized for `capacity_hint` messages, at most
    /// [`MAX_CAPACITY_HINT`].
    pub fn with_capacity(capacity_hint: usize) -> Self {
        let capacity_hint = capacity_hint.min(MAX_CAPACITY_HINT);
        Self {
            inner: Mutex::new(Inner {
                messages: Vec::with_capacity(capacity_hint),
                appended: 0,
                drained: 0,
            }),
            capacity_hint,
        }
    }

    pub fn capacity_hint(&self) -> usize {
        self.capacity_hint
    }

    /// Appends `message` at the tail.
    #[inline]
    pub fn append(&self, message: Message) {
        let mut inner = self.inner.lock();
        inner.messages.push(message);
        inner.appended += 1;
        trace!(resident = inner.messages.len(), "message appended");
    }

    /// Takes every buffered message in insertion order and empties the buffer.
    ///
    /// The replacement storage is re-allocated at the capacity hint.
    pub fn drain_all(&self) -> Vec<Message> {
        let mut inner = self.inner.lock();
        let drained = std::mem::replace(
            &mut inner.messages,
            Vec::with_capacity(self.capacity_hint),
        );
        inner.drained += drained.len() as u64;
        drained
    }

    pub fn len(&self) -> usize {
        self.inner.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().messages.is_empty()
    }

    /// Snapshot of the counters taken under the lock.
    pub fn stats(&self) -> BufferStats {
        let inner = self.inner.lock();
        BufferStats {
            appended: inner.appended,
            drained: inner.drained,
            resident: inner.messages.len(),
        }
    }
}

impl std::fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("capacity_hint", &self.capacity_hint)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Local, TimeZone};
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;

    fn message_at(offset_secs: i64) -> Message {
        let base = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Message::new(base + ChronoDuration::seconds(offset_secs))
    }

    #[test]
    fn capacity_hint_for_default_periods() {
        let hint = capacity_hint(Duration::from_secs(2), Duration::from_secs(5));
        assert_eq!(hint, 3);
    }

    #[test]
    fn capacity_hint_rounds_to_nearest() {
        assert_eq!(
            capacity_hint(Duration::from_secs(3), Duration::from_secs(4)),
            2
        );
        assert_eq!(
            capacity_hint(Duration::from_secs(5), Duration::from_secs(1)),
            1
        );
        assert_eq!(capacity_hint(Duration::ZERO, Duration::from_secs(5)), 1);
    }

    #[test]
    fn capacity_hint_is_clamped_for_extreme_ratios() {
        let year = Duration::from_secs(365 * 86400);
        assert_eq!(
            capacity_hint(Duration::from_secs(1), year),
            MAX_CAPACITY_HINT
        );
        assert_eq!(
            capacity_hint(Duration::from_secs(1), Duration::from_secs(i64::MAX as u64)),
            MAX_CAPACITY_HINT
        );
        assert_eq!(
            capacity_hint(Duration::from_nanos(1), Duration::MAX),
            MAX_CAPACITY_HINT
        );

        let buffer = SharedBuffer::with_capacity(usize::MAX);
        assert_eq!(buffer.capacity_hint(), MAX_CAPACITY_HINT);
        buffer.append(message_at(0));
        assert_eq!(buffer.drain_all().len(), 1);
    }

    #[test]
    fn hint_is_not_a_limit() {
        let buffer = SharedBuffer::with_capacity(3);
        for i in 0..10 {
            buffer.append(message_at(i));
        }
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.drain_all().len(), 10);
    }

    #[test]
    fn drain_empty_is_noop() {
        let buffer = SharedBuffer::with_capacity(3);
        assert!(buffer.drain_all().is_empty());
        assert!(buffer.is_empty());
        assert!(buffer.drain_all().is_empty());
        assert_eq!(buffer.stats(), BufferStats::default());
    }

    #[test]
    fn drain_resets_buffer() {
        let buffer = SharedBuffer::with_capacity(2);
        buffer.append(message_at(1));
        buffer.append(message_at(2));

        let first = buffer.drain_all();
        assert_eq!(first.len(), 2);
        assert!(buffer.is_empty());

        buffer.append(message_at(3));
        let second = buffer.drain_all();
        assert_eq!(second, vec![message_at(3)]);

        let stats = buffer.stats();
        assert_eq!(stats.appended, 3);
        assert_eq!(stats.drained, 3);
        assert_eq!(stats.resident, 0);
    }

    #[test]
    fn concurrent_append_and_drain_stay_balanced() {
        let buffer = Arc::new(SharedBuffer::with_capacity(4));
        let per_producer = 2_000;

        let producers: Vec<_> = (0..2)
            .map(|_| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for i in 0..per_producer {
                        buffer.append(message_at(i));
                    }
                })
            })
            .collect();

        let drainer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                let mut seen = 0usize;
                for _ in 0..500 {
                    seen += buffer.drain_all().len();
                    assert!(buffer.stats().is_balanced());
                    thread::yield_now();
                }
                seen
            })
        };

        for producer in producers {
            producer.join().unwrap();
        }
        let seen = drainer.join().unwrap();

        let stats = buffer.stats();
        assert!(stats.is_balanced());
        assert_eq!(stats.appended, 2 * per_producer as u64);
        assert_eq!(seen + stats.resident, 2 * per_producer as usize);
    }

    proptest! {
        #[test]
        fn drain_returns_appends_in_order(offsets in proptest::collection::vec(0i64..100_000, 0..64)) {
            let buffer = SharedBuffer::with_capacity(3);
            for offset in &offsets {
                buffer.append(message_at(*offset));
            }

            let drained = buffer.drain_all();
            let expected: Vec<Message> = offsets.iter().map(|o| message_at(*o)).collect();
            prop_assert_eq!(drained, expected);
            prop_assert!(buffer.is_empty());
        }

        #[test]
        fn interleaved_batches_keep_counts(batches in proptest::collection::vec(0usize..16, 1..16)) {
            let buffer = SharedBuffer::with_capacity(3);
            let mut total_drained = 0usize;
            for (i, batch) in batches.iter().enumerate() {
                for j in 0..*batch {
                    buffer.append(message_at((i * 16 + j) as i64));
                }
                if i % 2 == 1 {
                    total_drained += buffer.drain_all().len();
                }
                prop_assert!(buffer.stats().is_balanced());
            }
            let stats = buffer.stats();
            prop_assert_eq!(stats.drained as usize, total_drained);
            prop_assert_eq!(stats.appended as usize, batches.iter().sum::<usize>());
        }
    }
}
