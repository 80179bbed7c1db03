//! Injectable time source.
//!
//! Deadline computation always goes through a [`Clock`] so it can be pinned
//! in tests. Production code uses [`SystemClock`]; tests use [`FixedClock`].

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A source of the current instant.
pub trait Clock: Send + Sync {
    /// The current instant on this clock.
    fn now(&self) -> Instant;
}

/// The real wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that reports a fixed instant until explicitly moved.
///
/// Clones share the same underlying instant, so a test can hand the clock
/// to the code under test and advance it from the outside.
#[derive(Clone, Debug)]
pub struct FixedClock {
    now: Arc<Mutex<Instant>>,
}

impl FixedClock {
    /// A clock pinned at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().expect("clock poisoned");
        *now += duration;
    }

    /// Pin the clock at `instant`.
    pub fn set(&self, instant: Instant) {
        *self.now.lock().expect("clock poisoned") = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Instant {
        *self.now.lock().expect("clock poisoned")
    }
}
