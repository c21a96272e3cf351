//! Session-wide request pacing.
//!
//! All workers of a session share one [`Pacer`]. Each call to [`Pacer::wait`]
//! reserves the next request slot and sleeps until it arrives. A slot is
//! always at least one delay after both the caller's arrival and the previous
//! slot, so every request is preceded by a full pause (the first one too) and
//! no two requests start closer together than the delay, whatever the number
//! of workers.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::trace;

#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    /// Slot handed to the most recent caller. `None` until the first request.
    last_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_slot: Mutex::new(None),
        }
    }

    /// Reserve the next slot and sleep until it is due.
    pub async fn wait(&self) {
        let slot = self.reserve().await;
        trace!(
            "Waiting for request slot ({:?} from now)",
            slot.saturating_duration_since(Instant::now())
        );
        sleep_until(slot).await;
    }

    /// Reserve the next slot without sleeping.
    async fn reserve(&self) -> Instant {
        let mut last = self.last_slot.lock().await;
        let now = Instant::now();
        let earliest = match *last {
            None => now,
            Some(previous) => previous.max(now),
        };
        let slot = earliest + self.delay;
        *last = Some(slot);
        slot
    }
}
