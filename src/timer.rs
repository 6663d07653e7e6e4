//! Page-clock timers
//!
//! All time-driven behavior (debounced scroll handlers, notification expiry,
//! counter interpolation) runs against an explicit page clock: the elapsed
//! time since page load, passed in with every event. Nothing here reads the
//! wall clock.

use std::time::Duration;

/// Trailing-edge debounce with a single pending deadline.
///
/// Every [`Debouncer::call`] replaces the pending deadline, so the handler
/// fires once the calls have been quiet for `wait`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    wait: Duration,
    pending: Option<Duration>,
}

impl Debouncer {
    pub fn new(wait: Duration) -> Self {
        Self { wait, pending: None }
    }

    pub fn from_millis(wait_ms: u64) -> Self {
        Self::new(Duration::from_millis(wait_ms))
    }

    /// Schedule the handler, dropping any previously pending deadline
    pub fn call(&mut self, now: Duration) {
        self.pending = Some(now + self.wait);
    }

    /// Returns true exactly once when the pending deadline has passed
    pub fn fire_if_due(&mut self, now: Duration) -> bool {
        match self.pending {
            Some(deadline) if now >= deadline => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.pending
    }
}

/// Convert a page-clock timestamp in milliseconds
pub fn at_ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
