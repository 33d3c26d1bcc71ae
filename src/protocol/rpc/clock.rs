//! Time source for the retransmission timer.

use std::time::{Duration, Instant};

/// Monotonic time, measured from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// [`Clock`] backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}
