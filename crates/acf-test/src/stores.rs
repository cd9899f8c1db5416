//! In-memory store factories wired together for test harness construction.

use std::sync::Arc;

use acf_audit::{AuditSink, MemoryAuditSink};
use acf_core::Clock;
use acf_storage::{MemoryIdempotencyStore, MemorySessionTier, MemoryTurnStore, SharedTurnStore, TwoTierSessionStore};
use chrono::Duration;

/// A fresh, empty [`SharedTurnStore`] backed by [`MemoryTurnStore`].
#[must_use]
pub fn test_turn_store() -> SharedTurnStore {
    Arc::new(MemoryTurnStore::new())
}

/// A two-tier session store whose hot and persistent tiers are both
/// in-memory, ticking off the same `clock`.
#[must_use]
pub fn test_session_store<C: Clock + 'static>(clock: Arc<C>) -> Arc<TwoTierSessionStore> {
    let hot = Arc::new(MemorySessionTier::new(clock.clone()));
    let persistent = Arc::new(MemorySessionTier::new(clock));
    Arc::new(TwoTierSessionStore::new(hot, persistent, Duration::minutes(10)))
}

/// A fresh in-memory idempotency store for any of the three scopes, ticking
/// off `clock`.
#[must_use]
pub fn test_idempotency_store<C: Clock + 'static>(clock: Arc<C>) -> Arc<MemoryIdempotencyStore<C>> {
    Arc::new(MemoryIdempotencyStore::new(clock))
}

/// A fresh, empty in-memory audit sink.
#[must_use]
pub fn test_audit_sink() -> Arc<dyn AuditSink> {
    Arc::new(MemoryAuditSink::new())
}
