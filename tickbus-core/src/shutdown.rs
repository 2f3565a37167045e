//! Shared deadline signal for cooperative loop cancellation.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Roughly 30 years, used in place of instants that overflow the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + delay` on the tokio clock, saturating to a far-future instant.
pub fn instant_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay)
        .unwrap_or_else(|| now + FAR_FUTURE)
}

/// A fixed point in time after which every loop holding a clone must stop.
///
/// Clones share one cancellation token: the first waiter that sees the
/// deadline pass cancels it for all others.
#[derive(Clone, Debug)]
pub struct Deadline {
    at: Instant,
    token: CancellationToken,
}

impl Deadline {
    /// Deadline `timeout` from now on the tokio clock.
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: instant_after(timeout),
            token: CancellationToken::new(),
        }
    }

    /// Resolves once the deadline has passed.
    pub async fn expired(&self) {
        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = sleep_until(self.at) => self.token.cancel(),
        }
    }
}
