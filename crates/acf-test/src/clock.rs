//! A deterministic [`Clock`] test double.

use std::sync::Mutex;

use acf_core::Clock;
use chrono::{DateTime, Duration, Utc};

/// A clock that only moves when told to, so accumulator windows, lease
/// TTLs, and idempotency expiry can be exercised deterministically instead
/// of racing real wall-clock sleeps.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Start the clock at a fixed instant.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    /// Start the clock at an arbitrary, repeatable instant, for tests that
    /// don't care what the exact value is.
    #[must_use]
    pub fn epoch() -> Self {
        Self::new(DateTime::from_timestamp(1_700_000_000, 0).expect("fixed epoch is in range"))
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += delta;
    }

    /// Pin the clock to an exact instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().expect("clock mutex poisoned") = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advancing_moves_time_forward_by_exactly_the_delta() {
        let clock = ManualClock::epoch();
        let start = clock.now();
        clock.advance(Duration::seconds(30));
        assert_eq!(clock.now(), start + Duration::seconds(30));
    }

    #[test]
    fn set_pins_an_exact_instant() {
        let clock = ManualClock::epoch();
        let target = DateTime::from_timestamp(0, 0).unwrap();
        clock.set(target);
        assert_eq!(clock.now(), target);
    }
}
