//! The per-session bounded overflow FIFO (§4.6): "Bounded queue overflow
//! (e.g., >N messages within window W) rejects with backpressure. N and W
//! are configured per channel."

use std::collections::VecDeque;

use acf_channel::InboundEnvelope;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Tracks admission timestamps per session so a burst of QUEUE-bound
/// messages against one session can be capped independently of every other
/// session's traffic, and holds the actual parked envelopes so the workflow
/// that unblocks them can start a successor turn once the in-flight one
/// reaches a terminal status.
#[derive(Default)]
pub struct OverflowTracker {
    arrivals: DashMap<String, VecDeque<DateTime<Utc>>>,
    parked: DashMap<String, VecDeque<InboundEnvelope>>,
}

impl OverflowTracker {
    /// Construct an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to admit one more queued message for `canonical_session_key`
    /// at `now`. Entries older than `window_ms` are pruned before the count
    /// is checked, so the cap is a true sliding window.
    ///
    /// Returns `true` iff admission succeeded (and the arrival is recorded).
    pub fn try_admit(&self, canonical_session_key: &str, now: DateTime<Utc>, max_queued: usize, window_ms: u64) -> bool {
        let window = Duration::milliseconds(window_ms as i64);
        let mut arrivals = self.arrivals.entry(canonical_session_key.to_string()).or_default();
        while let Some(&oldest) = arrivals.front() {
            if now - oldest > window {
                arrivals.pop_front();
            } else {
                break;
            }
        }
        if arrivals.len() >= max_queued {
            return false;
        }
        arrivals.push_back(now);
        true
    }

    /// Clear all tracked arrivals for a session, e.g. once its overflow FIFO
    /// has been drained into a fresh turn.
    pub fn clear(&self, canonical_session_key: &str) {
        self.arrivals.remove(canonical_session_key);
    }

    /// Park an admitted envelope's content for later pickup, in arrival
    /// order. Callers admit via [`OverflowTracker::try_admit`] first; parking
    /// itself is unconditional so it can't diverge from the admission
    /// decision the caller already made.
    pub fn park(&self, canonical_session_key: &str, envelope: InboundEnvelope) {
        self.parked.entry(canonical_session_key.to_string()).or_default().push_back(envelope);
    }

    /// Drain every envelope parked for a session, oldest first, clearing
    /// both the content queue and the arrival-timestamp window.
    pub fn drain_parked(&self, canonical_session_key: &str) -> Vec<InboundEnvelope> {
        self.clear(canonical_session_key);
        self.parked
            .remove(canonical_session_key)
            .map(|(_, queue)| queue.into_iter().collect())
            .unwrap_or_default()
    }
}
