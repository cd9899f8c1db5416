//! The three-scope idempotency layer (§4.4): independent stores with
//! disjoint key prefixes, each guarding a different replay hazard.

use std::sync::Arc;

use acf_core::Clock;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::error::{StorageError, StorageResult};

/// The outcome of [`IdempotencyStore::try_record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyOutcome {
    /// No prior record existed (or it expired); the caller's operation
    /// should proceed and its result has been recorded.
    Fresh,
    /// A live record already exists for this key with a matching payload
    /// hash; the caller should short-circuit with the cached value.
    Duplicate(serde_json::Value),
}

/// A single idempotency scope: API, Beat, or Tool (§4.4).
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Atomically check-and-record an idempotency key.
    ///
    /// If no live record exists for `key`, records `{payload_hash, value}`
    /// with the given `ttl` and returns [`IdempotencyOutcome::Fresh`]. If a
    /// live record exists with a matching `payload_hash`, returns
    /// [`IdempotencyOutcome::Duplicate`] with its cached value and does not
    /// overwrite it. If a live record exists with a *different*
    /// `payload_hash`, fails closed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IdempotencyConflict`] on a payload-hash
    /// mismatch.
    async fn try_record(
        &self,
        key: &str,
        payload_hash: &str,
        value: serde_json::Value,
        ttl: Duration,
    ) -> StorageResult<IdempotencyOutcome>;

    /// Look up a key without recording, for diagnostics.
    async fn peek(&self, key: &str) -> StorageResult<Option<serde_json::Value>>;
}

struct Record {
    payload_hash: String,
    value: serde_json::Value,
    expires_at: DateTime<Utc>,
}

/// An in-memory [`IdempotencyStore`]. One instance per scope; the scope's
/// key prefix is the caller's responsibility (see [`scoped_key`]).
pub struct MemoryIdempotencyStore<C: Clock> {
    clock: Arc<C>,
    records: DashMap<String, Record>,
}

impl<C: Clock> MemoryIdempotencyStore<C> {
    /// Construct an empty store using `clock` to evaluate TTL expiry.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            clock,
            records: DashMap::new(),
        }
    }
}

#[async_trait]
impl<C: Clock> IdempotencyStore for MemoryIdempotencyStore<C> {
    async fn try_record(
        &self,
        key: &str,
        payload_hash: &str,
        value: serde_json::Value,
        ttl: Duration,
    ) -> StorageResult<IdempotencyOutcome> {
        let now = self.clock.now();
        if let Some(existing) = self.records.get(key) {
            if existing.expires_at > now {
                return if existing.payload_hash == payload_hash {
                    Ok(IdempotencyOutcome::Duplicate(existing.value.clone()))
                } else {
                    Err(StorageError::IdempotencyConflict)
                };
            }
        }
        self.records.insert(
            key.to_string(),
            Record {
                payload_hash: payload_hash.to_string(),
                value,
                expires_at: now + ttl,
            },
        );
        Ok(IdempotencyOutcome::Fresh)
    }

    async fn peek(&self, key: &str) -> StorageResult<Option<serde_json::Value>> {
        let now = self.clock.now();
        Ok(self
            .records
            .get(key)
            .filter(|r| r.expires_at > now)
            .map(|r| r.value.clone()))
    }
}

/// The three idempotency scopes named in §4.4, each with its own default
/// TTL. `acf-config` may override these per tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdempotencyScope {
    /// Dedups end-to-end HTTP requests. Default TTL 5 minutes.
    Api,
    /// Dedups a `LogicalTurn` against re-submission of the same message
    /// set. Default TTL 60 seconds.
    Beat,
    /// Guards side-effecting tool calls against retries. Default TTL 24
    /// hours.
    Tool,
}

impl IdempotencyScope {
    /// This scope's default TTL, per §4.4.
    #[must_use]
    pub fn default_ttl(self) -> Duration {
        match self {
            Self::Api => Duration::minutes(5),
            Self::Beat => Duration::seconds(60),
            Self::Tool => Duration::hours(24),
        }
    }

    /// The key prefix this scope uses, so the three scopes' keyspaces never
    /// collide even when they share one backing store.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Beat => "beat",
            Self::Tool => "tool",
        }
    }
}

/// Build the scoped key a given scope's store should use, namespacing the
/// caller's logical key under the scope's prefix and tenant.
#[must_use]
pub fn scoped_key(scope: IdempotencyScope, tenant_id: &str, logical_key: &str) -> String {
    format!("{}:{tenant_id}:{logical_key}", scope.prefix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use acf_core::SystemClock;

    fn store() -> MemoryIdempotencyStore<SystemClock> {
        MemoryIdempotencyStore::new(Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn fresh_key_is_recorded_and_returned_fresh() {
        let store = store();
        let outcome = store
            .try_record("k1", "hash-a", serde_json::json!({"ok": true}), Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(outcome, IdempotencyOutcome::Fresh);
    }

    #[tokio::test]
    async fn repeat_with_same_hash_returns_cached_duplicate() {
        let store = store();
        store
            .try_record("k1", "hash-a", serde_json::json!({"turn": "t1"}), Duration::minutes(5))
            .await
            .unwrap();
        let outcome = store
            .try_record("k1", "hash-a", serde_json::json!({"turn": "t2"}), Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(outcome, IdempotencyOutcome::Duplicate(serde_json::json!({"turn": "t1"})));
    }

    #[tokio::test]
    async fn repeat_with_different_hash_fails_closed() {
        let store = store();
        store
            .try_record("k1", "hash-a", serde_json::json!({"turn": "t1"}), Duration::minutes(5))
            .await
            .unwrap();
        let err = store
            .try_record("k1", "hash-b", serde_json::json!({"turn": "t2"}), Duration::minutes(5))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::IdempotencyConflict));
    }

    #[test]
    fn scope_prefixes_are_distinct() {
        assert_ne!(IdempotencyScope::Api.prefix(), IdempotencyScope::Beat.prefix());
        assert_ne!(IdempotencyScope::Beat.prefix(), IdempotencyScope::Tool.prefix());
    }

    #[test]
    fn each_scope_has_its_own_default_ttl() {
        assert_eq!(IdempotencyScope::Api.default_ttl(), Duration::minutes(5));
        assert_eq!(IdempotencyScope::Beat.default_ttl(), Duration::seconds(60));
        assert_eq!(IdempotencyScope::Tool.default_ttl(), Duration::hours(24));
    }
}
