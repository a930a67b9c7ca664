//! [`Clock`] implementations.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::traits::Clock;
use crate::types::Timestamp;

/// Wall-clock time from the system, clamped so it never moves backwards.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let wall = chrono::Utc::now().timestamp().max(0) as u64;
        let prev = self.last.fetch_max(wall, Ordering::AcqRel);
        prev.max(wall)
    }
}

/// A clock that only moves when told to. Used by tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Move the clock forward by `secs`. Returns the new time.
    pub fn advance(&self, secs: u64) -> Timestamp {
        self.now.fetch_add(secs, Ordering::AcqRel) + secs
    }

    /// Jump to `at`. Earlier times are ignored to keep the clock non-decreasing.
    pub fn set(&self, at: Timestamp) {
        self.now.fetch_max(at, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::Acquire)
    }
}

/// Any `Fn() -> Timestamp` closure is a clock, for callers that already own a
/// time source.
impl<F> Clock for F
where
    F: Fn() -> Timestamp + Send + Sync,
{
    fn now(&self) -> Timestamp {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now(), 1_000);
        assert_eq!(clock.advance(60), 1_060);
        assert_eq!(clock.now(), 1_060);
    }

    #[test]
    fn manual_clock_never_goes_back() {
        let clock = ManualClock::new(1_000);
        clock.set(500);
        assert_eq!(clock.now(), 1_000);
        clock.set(2_000);
        assert_eq!(clock.now(), 2_000);
    }

    #[test]
    fn closure_is_a_clock() {
        let clock: Box<dyn Clock> = Box::new(|| 42u64);
        assert_eq!(clock.now(), 42);
    }

    #[test]
    fn system_clock_is_monotonic_and_recent() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
        // After 2023-11-14.
        assert!(a > 1_700_000_000);
    }
}
