//! Inter-request pacing policy.
//!
//! Collectors issue several queries against the same platform in one run; the
//! platforms share rate limits across all clients. [`Pacer`] makes the pause
//! between successive requests a first-class, configurable policy instead of
//! inline sleeps scattered through collector loops.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between successive requests to one platform.
///
/// The first call to [`Pacer::pause`] returns immediately; each subsequent
/// call sleeps until `min_interval` has elapsed since the previous request.
/// Safe to share across tasks — the last-request instant is mutex-guarded, so
/// concurrent callers are serialized onto the pacing schedule.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Pacer {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Pacer configured in milliseconds, the unit used by `platforms.yaml`.
    #[must_use]
    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Wait until the pacing interval since the previous request has elapsed,
    /// then claim the current slot.
    pub async fn pause(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
