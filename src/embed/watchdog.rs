//! Load timeout watchdog.

use std::time::{Duration, Instant};

use super::Generation;

/// How long a target may stay loading before it is declared failed.
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(10);

/// A single armed deadline, keyed to the generation it was armed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watchdog {
    generation: Generation,
    deadline: Instant,
}

impl Watchdog {
    pub fn arm(generation: Generation, now: Instant, timeout: Duration) -> Self {
        Self {
            generation,
            deadline: now + timeout,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}
