//! Global pacing of outgoing registry requests

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

use crate::config::MAX_DURATION_SECS;

/// Interval gate shared by every check in a run.
///
/// Grants at most one request per `interval` across all callers, whichever
/// registry they target. Waiters queue on a fair mutex, so grants are handed
/// out in arrival order. Intervals longer than [`MAX_DURATION_SECS`] are clamped.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.min(Duration::from_secs(MAX_DURATION_SECS)),
            next_slot: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the caller may issue its next request.
    pub async fn acquire(&self) {
        let mut next_slot = self.next_slot.lock().await;

        let now = Instant::now();
        let granted_at = match *next_slot {
            Some(slot) if slot > now => {
                debug!("Rate limiter: waiting {:?}", slot - now);
                sleep_until(slot).await;
                slot
            }
            _ => now,
        };

        *next_slot = Some(granted_at.checked_add(self.interval).unwrap_or(granted_at));
    }
}
