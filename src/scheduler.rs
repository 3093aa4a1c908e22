//! Rate-limits how often a connection emits a `FramebufferUpdate`.
//!
//! The reference C implementation (`original_source/rfb/main.c`) sends
//! three fixed updates back to back with no rate limiting at all, and only
//! ever ticks while blocked inside its own read loop. This core instead
//! runs the scheduler as a cooperative tick alongside message reads, so an
//! idle connection still gets refreshed, and separates the gating decision
//! (this module) from the tick source (`tokio::time::interval` in
//! `connection.rs`) so it can be tested without an async runtime.

use std::time::{Duration, Instant};

use crate::config::DEFAULT_REFRESH_PERIOD;

/// Decides when a connection should next emit a `FramebufferUpdate`.
///
/// Holds no runtime/timer state of its own; `poll` is a pure function of
/// `now` and the caller's refresh-pending flag plus this struct's
/// last-send bookkeeping, so it can be driven by a fake clock in tests.
pub struct UpdateScheduler {
    period: Duration,
    last_sent: Option<Instant>,
}

impl UpdateScheduler {
    /// Creates a scheduler with the given minimum interval between
    /// updates.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self { period, last_sent: None }
    }

    /// Decides whether an update should be sent now.
    ///
    /// Returns `true` (and records `now` as the last-sent time) when
    /// `refresh_pending` is set and at least `period` has elapsed since
    /// the last update this scheduler approved. Returns `false`
    /// otherwise, leaving `refresh_pending` for the caller to clear only
    /// when `true` is returned.
    pub fn poll(&mut self, now: Instant, refresh_pending: bool) -> bool {
        if !refresh_pending {
            return false;
        }
        let due = match self.last_sent {
            None => true,
            Some(last) => now.duration_since(last) >= self.period,
        };
        if due {
            self.last_sent = Some(now);
        }
        due
    }
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_update_without_a_pending_refresh() {
        let mut scheduler = UpdateScheduler::new(Duration::from_millis(20));
        assert!(!scheduler.poll(Instant::now(), false));
    }

    #[test]
    fn first_pending_refresh_always_fires() {
        let mut scheduler = UpdateScheduler::new(Duration::from_millis(20));
        assert!(scheduler.poll(Instant::now(), true));
    }

    #[test]
    fn refuses_to_fire_again_before_the_period_elapses() {
        let mut scheduler = UpdateScheduler::new(Duration::from_millis(20));
        let t0 = Instant::now();
        assert!(scheduler.poll(t0, true));
        assert!(!scheduler.poll(t0 + Duration::from_millis(5), true));
    }

    #[test]
    fn fires_again_once_the_period_elapses() {
        let mut scheduler = UpdateScheduler::new(Duration::from_millis(20));
        let t0 = Instant::now();
        assert!(scheduler.poll(t0, true));
        assert!(scheduler.poll(t0 + Duration::from_millis(21), true));
    }
}
