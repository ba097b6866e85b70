//! Fixed minimum spacing between consecutive requests.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Enforces a minimum interval between consecutive fetches, whatever the host.
#[derive(Debug)]
pub struct Politeness {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Politeness {
    /// Creates a limiter with the given interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// The configured interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleeps until the interval since the previous call has elapsed, then
    /// records the new slot.
    pub async fn wait(&self) {
        let delay = {
            let mut last = self.last.lock();
            let now = Instant::now();
            let ready_at = last.map_or(now, |prev| prev + self.interval);
            let slot = ready_at.max(now);
            *last = Some(slot);
            slot - now
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
