//! Two-tier [`SessionStore`] (§4.2): a short-TTL hot tier backed by a
//! long-TTL (or indefinite) persistent tier, with promotion on hot miss.

use std::sync::Arc;

use acf_core::{Clock, FencingToken, Session, SessionKey};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::{StorageError, StorageResult};

/// A single storage tier capable of holding [`Session`] records.
///
/// Both the hot and persistent tiers of a [`TwoTierSessionStore`] implement
/// this; the only difference between them is their TTL and backing medium.
#[async_trait]
pub trait SessionTier: Send + Sync {
    /// Fetch a session by key, or `None` if absent or expired.
    async fn get(&self, key: &SessionKey) -> StorageResult<Option<Session>>;

    /// Write a session under its key with the given fencing token and TTL.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::FencingRegression`] if `token` is not
    /// strictly greater than the last token this tier accepted for `key`.
    async fn put(&self, session: Session, token: FencingToken, ttl: Option<chrono::Duration>) -> StorageResult<()>;

    /// Remove a session.
    async fn delete(&self, key: &SessionKey) -> StorageResult<()>;

    /// All sessions for a given `(tenant, agent)` pair.
    async fn list_by_agent(&self, tenant_id: &str, agent_id: &str) -> StorageResult<Vec<Session>>;

    /// All sessions for a given `(tenant, interlocutor)` pair, across
    /// channels.
    async fn list_by_interlocutor(&self, tenant_id: &str, interlocutor_id: &str) -> StorageResult<Vec<Session>>;

    /// Find a session by the channel's native user identity, if indexed.
    async fn find_by_channel_identity(
        &self,
        tenant_id: &str,
        channel: &str,
        channel_identity: &str,
    ) -> StorageResult<Option<Session>>;

    /// Find sessions whose active scenario/step hashes to `step_hash`
    /// (used by scenario-migration tooling).
    async fn find_by_step_hash(&self, tenant_id: &str, step_hash: &str) -> StorageResult<Vec<Session>>;
}

struct Entry {
    session: Session,
    token: FencingToken,
    expires_at: Option<DateTime<Utc>>,
}

/// An in-memory [`SessionTier`] used for the hot tier in production and for
/// both tiers in tests.
///
/// Expiry is lazy: an expired entry is treated as absent by `get` and
/// dropped the next time that key is read or written.
pub struct MemorySessionTier<C: Clock> {
    clock: Arc<C>,
    entries: DashMap<String, Entry>,
}

impl<C: Clock> MemorySessionTier<C> {
    /// Construct an empty tier using `clock` to evaluate TTL expiry.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            clock,
            entries: DashMap::new(),
        }
    }

    fn is_live(&self, entry: &Entry) -> bool {
        entry.expires_at.is_none_or(|at| self.clock.now() < at)
    }
}

#[async_trait]
impl<C: Clock> SessionTier for MemorySessionTier<C> {
    async fn get(&self, key: &SessionKey) -> StorageResult<Option<Session>> {
        let canonical = key.as_canonical();
        let Some(entry) = self.entries.get(&canonical) else {
            return Ok(None);
        };
        if self.is_live(&entry) {
            Ok(Some(entry.session.clone()))
        } else {
            drop(entry);
            self.entries.remove(&canonical);
            Ok(None)
        }
    }

    async fn put(&self, session: Session, token: FencingToken, ttl: Option<chrono::Duration>) -> StorageResult<()> {
        let canonical = session.session_key.as_canonical();
        if let Some(existing) = self.entries.get(&canonical) {
            if token <= existing.token {
                return Err(StorageError::FencingRegression {
                    key: session.session_key.clone(),
                    incoming: token.raw(),
                    last_seen: existing.token.raw(),
                });
            }
        }
        let expires_at = ttl.map(|d| self.clock.now() + d);
        self.entries.insert(
            canonical,
            Entry {
                session,
                token,
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &SessionKey) -> StorageResult<()> {
        self.entries.remove(&key.as_canonical());
        Ok(())
    }

    async fn list_by_agent(&self, tenant_id: &str, agent_id: &str) -> StorageResult<Vec<Session>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| self.is_live(&e))
            .map(|e| e.session.clone())
            .filter(|s| s.tenant_id == tenant_id && s.agent_id == agent_id)
            .collect())
    }

    async fn list_by_interlocutor(&self, tenant_id: &str, interlocutor_id: &str) -> StorageResult<Vec<Session>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| self.is_live(&e))
            .map(|e| e.session.clone())
            .filter(|s| s.tenant_id == tenant_id && s.interlocutor_id == interlocutor_id)
            .collect())
    }

    async fn find_by_channel_identity(
        &self,
        tenant_id: &str,
        channel: &str,
        channel_identity: &str,
    ) -> StorageResult<Option<Session>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| self.is_live(&e))
            .map(|e| e.session.clone())
            .find(|s| s.tenant_id == tenant_id && s.channel == channel && s.interlocutor_id == channel_identity))
    }

    async fn find_by_step_hash(&self, tenant_id: &str, step_hash: &str) -> StorageResult<Vec<Session>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| self.is_live(&e))
            .map(|e| e.session.clone())
            .filter(|s| {
                s.tenant_id == tenant_id
                    && s.active_step_id
                        .as_deref()
                        .is_some_and(|step| blake3::hash(step.as_bytes()).to_hex().as_str() == step_hash)
            })
            .collect())
    }
}

/// The public two-tier session store (§4.2): hot tier authoritative for
/// reads during an active conversation, persistent tier the source of
/// truth across restarts.
pub struct TwoTierSessionStore {
    hot: Arc<dyn SessionTier>,
    persistent: Arc<dyn SessionTier>,
    hot_ttl: chrono::Duration,
}

impl TwoTierSessionStore {
    /// Build a two-tier store from its tiers and the hot-tier TTL applied
    /// on write and on promotion.
    #[must_use]
    pub fn new(hot: Arc<dyn SessionTier>, persistent: Arc<dyn SessionTier>, hot_ttl: chrono::Duration) -> Self {
        Self {
            hot,
            persistent,
            hot_ttl,
        }
    }

    /// Read a session: hot tier first, falling back to and promoting from
    /// the persistent tier on miss.
    ///
    /// The promotion write is a cache fill, not a new authoritative write, so
    /// it carries [`FencingToken::zero`] rather than the caller's lease
    /// token — a caller reading mid-turn and later calling [`Self::save`]
    /// with its one lease token must not have that later write rejected as a
    /// regression against the token its own promotion just planted.
    ///
    /// # Errors
    ///
    /// Propagates backend errors from either tier.
    pub async fn get(&self, key: &SessionKey) -> StorageResult<Option<Session>> {
        if let Some(session) = self.hot.get(key).await? {
            return Ok(Some(session));
        }
        let Some(session) = self.persistent.get(key).await? else {
            return Ok(None);
        };
        self.hot.put(session.clone(), FencingToken::zero(), Some(self.hot_ttl)).await?;
        Ok(Some(session))
    }

    /// Write-through: persistent tier first, then hot, sharing one fencing
    /// token so both tiers agree on write order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::FencingRegression`] if either tier has
    /// already accepted a write with a token `>= token`.
    pub async fn save(&self, session: &Session, token: FencingToken) -> StorageResult<()> {
        self.persistent.put(session.clone(), token, None).await?;
        self.hot.put(session.clone(), token, Some(self.hot_ttl)).await?;
        Ok(())
    }

    /// Remove a session from both tiers.
    ///
    /// # Errors
    ///
    /// Propagates backend errors from either tier.
    pub async fn delete(&self, key: &SessionKey) -> StorageResult<()> {
        self.hot.delete(key).await?;
        self.persistent.delete(key).await?;
        Ok(())
    }

    /// All sessions for `(tenant, agent)`, read from the persistent tier
    /// (the tier of record for cross-session queries).
    ///
    /// # Errors
    ///
    /// Propagates backend errors from the persistent tier.
    pub async fn list_by_agent(&self, tenant_id: &str, agent_id: &str) -> StorageResult<Vec<Session>> {
        self.persistent.list_by_agent(tenant_id, agent_id).await
    }

    /// All sessions for `(tenant, interlocutor)`, read from the persistent
    /// tier.
    ///
    /// # Errors
    ///
    /// Propagates backend errors from the persistent tier.
    pub async fn list_by_interlocutor(&self, tenant_id: &str, interlocutor_id: &str) -> StorageResult<Vec<Session>> {
        self.persistent.list_by_interlocutor(tenant_id, interlocutor_id).await
    }

    /// Find a session by its channel-native identity.
    ///
    /// # Errors
    ///
    /// Propagates backend errors from the persistent tier.
    pub async fn find_session_by_channel_identity(
        &self,
        tenant_id: &str,
        channel: &str,
        channel_identity: &str,
    ) -> StorageResult<Option<Session>> {
        self.persistent
            .find_by_channel_identity(tenant_id, channel, channel_identity)
            .await
    }

    /// Find sessions whose scenario-step hash matches, for migration
    /// tooling.
    ///
    /// # Errors
    ///
    /// Propagates backend errors from the persistent tier.
    pub async fn find_sessions_by_step_hash(&self, tenant_id: &str, step_hash: &str) -> StorageResult<Vec<Session>> {
        self.persistent.find_by_step_hash(tenant_id, step_hash).await
    }

    /// Reassign a session from one agent to another, recording a context
    /// summary variable and bumping `last_activity_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if `from` has no session, or
    /// propagates fencing/backend errors on write.
    pub async fn transfer_session(
        &self,
        from: &SessionKey,
        to_agent: &str,
        context_summary: &str,
        token: FencingToken,
        now: DateTime<Utc>,
    ) -> StorageResult<Session> {
        let Some(mut session) = self.get(from).await? else {
            return Err(StorageError::NotFound(from.as_canonical()));
        };
        session.agent_id = to_agent.to_string();
        session.set_variable(
            "transfer_context_summary",
            serde_json::Value::String(context_summary.to_string()),
            now,
        );
        session.last_activity_at = now;
        self.save(&session, token).await?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acf_core::SystemClock;

    fn key() -> SessionKey {
        SessionKey::new("acme", "bot", "user-1", "web").unwrap()
    }

    fn store() -> TwoTierSessionStore {
        let clock = Arc::new(SystemClock);
        let hot = Arc::new(MemorySessionTier::new(clock.clone()));
        let persistent = Arc::new(MemorySessionTier::new(clock));
        TwoTierSessionStore::new(hot, persistent, chrono::Duration::minutes(5))
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let store = store();
        let session = Session::new(key(), Utc::now());
        store.save(&session, FencingToken::from_raw(1)).await.unwrap();
        let fetched = store.get(&key()).await.unwrap().unwrap();
        assert_eq!(fetched.session_key, key());
    }

    #[tokio::test]
    async fn hot_miss_promotes_from_persistent() {
        let clock = Arc::new(SystemClock);
        let hot = Arc::new(MemorySessionTier::new(clock.clone()));
        let persistent = Arc::new(MemorySessionTier::new(clock));
        let store = TwoTierSessionStore::new(hot.clone(), persistent.clone(), chrono::Duration::minutes(5));

        let session = Session::new(key(), Utc::now());
        persistent
            .put(session.clone(), FencingToken::from_raw(1), None)
            .await
            .unwrap();
        assert!(hot.get(&key()).await.unwrap().is_none());

        let fetched = store.get(&key()).await.unwrap();
        assert!(fetched.is_some());
        assert!(hot.get(&key()).await.unwrap().is_some());
    }

    /// A caller that reads a session under one lease token (promoting it
    /// from a hot-tier miss) and later saves under that *same* token must
    /// not have its save rejected — the promotion write must not consume
    /// the token's place in the hot tier's fencing history.
    #[tokio::test]
    async fn a_save_under_the_token_that_triggered_promotion_still_succeeds() {
        let clock = Arc::new(SystemClock);
        let hot = Arc::new(MemorySessionTier::new(clock.clone()));
        let persistent = Arc::new(MemorySessionTier::new(clock));
        let store = TwoTierSessionStore::new(hot.clone(), persistent, chrono::Duration::minutes(5));

        let session = Session::new(key(), Utc::now());
        let lease_token = FencingToken::from_raw(7);
        store.save(&session, FencingToken::from_raw(1)).await.unwrap();
        hot.delete(&key()).await.unwrap();

        let promoted = store.get(&key()).await.unwrap().expect("persistent tier still has it");
        assert_eq!(promoted.session_key, key());

        store
            .save(&promoted, lease_token)
            .await
            .expect("a same-lease save after a promotion must not look like a fencing regression");
    }

    #[tokio::test]
    async fn fencing_regression_is_rejected() {
        let store = store();
        let session = Session::new(key(), Utc::now());
        store.save(&session, FencingToken::from_raw(5)).await.unwrap();
        let err = store.save(&session, FencingToken::from_raw(3)).await.unwrap_err();
        assert!(matches!(err, StorageError::FencingRegression { .. }));
    }

    #[tokio::test]
    async fn transfer_session_reassigns_agent() {
        let store = store();
        let session = Session::new(key(), Utc::now());
        store.save(&session, FencingToken::from_raw(1)).await.unwrap();
        let transferred = store
            .transfer_session(&key(), "bot-2", "customer wants a refund", FencingToken::from_raw(2), Utc::now())
            .await
            .unwrap();
        assert_eq!(transferred.agent_id, "bot-2");
        assert!(transferred.variables.contains_key("transfer_context_summary"));
    }
}
