//! Injectable clock so time-dependent components stay deterministic in tests.
//!
//! Per the Design Notes, ACF uses a single injected clock source rather than
//! reading `Utc::now()` ad hoc throughout the workflow and accumulator.
//! Production code takes [`SystemClock`]; tests take a manual clock (see the
//! `acf-test` crate).

use chrono::{DateTime, Utc};

/// A source of the current time.
///
/// Implementations must be cheap to clone and safe to share across tasks.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// A [`Clock`] backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
