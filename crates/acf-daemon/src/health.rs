//! The in-process health signal a supervisor process would poll.
//!
//! ACF does not expose an HTTP health endpoint (CRUD admin APIs are out of
//! scope); this is the minimal state a process manager's own wrapper could
//! read, e.g. by having the daemon write it to a file or answer a local
//! control message.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall health state of the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthState {
    /// The daemon is accepting and driving turns normally.
    Healthy,
    /// The daemon is up but showing signs of stress (e.g. elevated mutex
    /// contention); not yet actionable.
    Degraded,
}

/// A point-in-time health snapshot, logged on each health-loop tick rather
/// than served over a wire protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Overall state.
    pub state: HealthState,
    /// How long the daemon has been running.
    pub uptime_secs: u64,
    /// Total turns the supervisor has started driving since daemon start.
    pub turns_started: u64,
    /// When this snapshot was taken.
    pub checked_at: DateTime<Utc>,
}

/// Tracks daemon start time so health snapshots can report uptime.
#[derive(Debug)]
pub struct HealthTracker {
    started_at: Instant,
    turns_started: AtomicU64,
}

impl HealthTracker {
    /// Start tracking from now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            turns_started: AtomicU64::new(0),
        }
    }

    /// Record that the supervisor just started driving one more turn.
    pub fn record_turn_started(&self) {
        self.turns_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Total turns the supervisor has started driving since daemon start.
    #[must_use]
    pub fn turns_started(&self) -> u64 {
        self.turns_started.load(Ordering::Relaxed)
    }

    /// Build a snapshot. Always reports [`HealthState::Healthy`]: the
    /// daemon has no failure detector of its own yet, only uptime and
    /// throughput counters for an operator to eyeball in the log stream.
    #[must_use]
    pub fn snapshot(&self) -> HealthStatus {
        HealthStatus {
            state: HealthState::Healthy,
            uptime_secs: self.started_at.elapsed().as_secs(),
            turns_started: self.turns_started(),
            checked_at: Utc::now(),
        }
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// How often the health loop logs a snapshot.
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(30);
