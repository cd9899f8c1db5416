//! Per-session event fan-out: how the Gateway tells a running
//! `LogicalTurnWorkflow` instance about a message it must not mutate turn
//! state for directly.
//!
//! The Gateway never holds the session mutex (§4.6), so it cannot append to
//! an ACCUMULATING turn or drive a PROCESSING turn's probe itself. Instead it
//! registers one unbounded channel per active session; the owning workflow
//! instance drains it between accumulation ticks and at each phase-boundary
//! probe check.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;

/// A fact the Gateway observed that the owning workflow instance must react
/// to at its next opportunity (accumulation tick or phase-boundary probe).
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// A new message arrived against this session's active turn.
    NewMessage {
        /// The message's identifier.
        message_id: String,
        /// Its text content.
        content: String,
        /// When the Gateway observed it.
        received_at: DateTime<Utc>,
    },
}

/// The Gateway's table of live per-session event channels.
///
/// A workflow instance registers itself on `acquire_mutex` (Step A of §4.7)
/// and deregisters on releasing the mutex in a terminal step. Registration
/// is last-writer-wins: a replacement workflow started after a crashed
/// holder's lease expires simply re-registers, and any events the Gateway
/// emits afterward go to the new registrant.
#[derive(Default)]
pub struct EventRegistry {
    senders: DashMap<String, mpsc::UnboundedSender<GatewayEvent>>,
}

impl EventRegistry {
    /// Construct an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `canonical_session_key` as having a live workflow instance,
    /// returning the receiver half the workflow should drain.
    #[must_use]
    pub fn register(&self, canonical_session_key: &str) -> mpsc::UnboundedReceiver<GatewayEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(canonical_session_key.to_string(), tx);
        rx
    }

    /// Remove the registration for `canonical_session_key`, if any.
    pub fn deregister(&self, canonical_session_key: &str) {
        self.senders.remove(canonical_session_key);
    }

    /// Emit an event to the workflow instance registered for
    /// `canonical_session_key`, if one exists.
    ///
    /// Returns `true` iff a live registrant received the event. A `false`
    /// return means no workflow is currently registered for this session —
    /// the caller (the Gateway's `ingest` path) treats this the same as "no
    /// active turn" and falls back to starting a new one.
    pub fn emit(&self, canonical_session_key: &str, event: GatewayEvent) -> bool {
        let Some(sender) = self.senders.get(canonical_session_key) else {
            return false;
        };
        sender.send(event).is_ok()
    }
}
