//! Time source abstraction for the classifier.
//!
//! The classifier never reads the system clock directly; it asks a `Clock`,
//! so replaying an identical request sequence against a fresh instance with
//! a controlled clock yields an identical sequence of verdicts.

use std::time::Instant;

/// Monotonic time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock backed by `Instant::now`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven clock for deterministic tests.
#[cfg(test)]
pub struct ManualClock {
    start: Instant,
    offset: std::sync::Mutex<std::time::Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: std::sync::Mutex::new(std::time::Duration::ZERO),
        }
    }

    pub fn advance(&self, by: std::time::Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn manual_clock_advances_only_when_told() {
        let clock = ManualClock::new();
        let first = clock.now();
        assert_eq!(clock.now(), first);
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), first + Duration::from_millis(250));
    }
}
