//! Clock abstraction for the polling waiter
//!
//! Waits read time and sleep through a [`Clock`], so tests can substitute a
//! [`ManualClock`] whose sleeps advance virtual time instead of blocking.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Source of time for blocking waits
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;

    /// Block the calling thread for `d`
    fn sleep(&self, d: Duration);
}

/// Real wall-clock time with thread-blocking sleeps
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// Virtual clock: `sleep` returns immediately and moves time forward.
///
/// ```
/// use std::time::Duration;
/// use sysio_harness::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let start = clock.now();
/// clock.sleep(Duration::from_secs(3600));
/// assert_eq!(clock.now() - start, Duration::from_secs(3600));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<u64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(0),
        }
    }

    /// Move time forward without counting a sleep
    pub fn advance(&self, d: Duration) {
        *self.elapsed.lock() += d;
    }

    /// Virtual time elapsed since creation
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }

    /// Number of `sleep` calls made so far
    pub fn sleep_count(&self) -> u64 {
        *self.sleeps.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock()
    }

    fn sleep(&self, d: Duration) {
        *self.sleeps.lock() += 1;
        self.advance(d);
    }
}
