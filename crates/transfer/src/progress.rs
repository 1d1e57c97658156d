use std::time::Duration;

use tokio::time::Instant;

/// Default minimum time between progress notifications.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Default byte delta that forces a progress notification: 1 MiB.
pub const DEFAULT_PROGRESS_BYTES: u64 = 1024 * 1024;

/// Rate limiter for progress notifications.
///
/// A report is due when `interval` has elapsed since the last one, when at
/// least `byte_delta` bytes were written since the last one, or when the
/// event is terminal. The first report is always due.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval: Duration,
    byte_delta: u64,
    last_time: Option<Instant>,
    last_bytes: u64,
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_INTERVAL, DEFAULT_PROGRESS_BYTES)
    }
}

impl ProgressThrottle {
    pub fn new(interval: Duration, byte_delta: u64) -> Self {
        Self {
            interval,
            byte_delta,
            last_time: None,
            last_bytes: 0,
        }
    }

    /// Returns `true` if a notification for `bytes` should go out at `now`.
    pub fn should_report(&self, now: Instant, bytes: u64, terminal: bool) -> bool {
        if terminal {
            return true;
        }
        let Some(last_time) = self.last_time else {
            return true;
        };
        now.saturating_duration_since(last_time) >= self.interval
            || bytes.saturating_sub(self.last_bytes) >= self.byte_delta
    }

    /// Records that a notification for `bytes` went out at `now`.
    pub fn mark_reported(&mut self, now: Instant, bytes: u64) {
        self.last_time = Some(now);
        self.last_bytes = bytes;
    }
}
