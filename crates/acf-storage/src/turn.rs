//! The [`TurnStore`] (§4.3): `LogicalTurn` CRUD with a conditional-write
//! uniqueness invariant on the active turn per session.

use std::sync::Arc;

use acf_core::{FencingToken, LogicalTurn, SessionKey, TurnId};
use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{StorageError, StorageResult};

/// CRUD and active-turn lookup for [`LogicalTurn`] records.
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// Fetch a turn by ID.
    async fn get(&self, turn_id: TurnId) -> StorageResult<Option<LogicalTurn>>;

    /// Write a turn, enforcing both fencing monotonicity and the "at most
    /// one active turn per session_key" invariant.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::FencingRegression`] on a stale token, or
    /// [`StorageError::UniquenessViolation`] if `turn` is active (status
    /// `ACCUMULATING`/`PROCESSING`) and a *different* active turn already
    /// exists for its `session_key`.
    async fn save(&self, turn: LogicalTurn, token: FencingToken) -> StorageResult<()>;

    /// The active (ACCUMULATING or PROCESSING) turn for a session, if any.
    async fn get_active_turn(&self, session_key: &SessionKey) -> StorageResult<Option<LogicalTurn>>;
}

struct Entry {
    turn: LogicalTurn,
    token: FencingToken,
}

/// An in-memory [`TurnStore`], sufficient as the single implementation —
/// unlike sessions, turns are not tiered (they are cheap and short-lived
/// enough to live entirely in the persistent store of record).
#[derive(Default)]
pub struct MemoryTurnStore {
    by_id: DashMap<TurnId, Entry>,
    active_by_session: DashMap<String, TurnId>,
}

impl MemoryTurnStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TurnStore for MemoryTurnStore {
    async fn get(&self, turn_id: TurnId) -> StorageResult<Option<LogicalTurn>> {
        Ok(self.by_id.get(&turn_id).map(|e| e.turn.clone()))
    }

    async fn save(&self, turn: LogicalTurn, token: FencingToken) -> StorageResult<()> {
        if let Some(existing) = self.by_id.get(&turn.id) {
            if token <= existing.token {
                return Err(StorageError::FencingRegression {
                    key: turn.session_key.clone(),
                    incoming: token.raw(),
                    last_seen: existing.token.raw(),
                });
            }
        }

        let canonical = turn.session_key.as_canonical();
        if turn.status.is_active() {
            if let Some(active) = self.active_by_session.get(&canonical) {
                if *active != turn.id {
                    return Err(StorageError::UniquenessViolation(format!(
                        "session {canonical} already has active turn {active}"
                    )));
                }
            }
        }

        let turn_id = turn.id;
        let status = turn.status;
        self.by_id.insert(turn_id, Entry { turn, token });

        if status.is_active() {
            self.active_by_session.insert(canonical, turn_id);
        } else if self.active_by_session.get(&canonical).is_some_and(|a| *a == turn_id) {
            self.active_by_session.remove(&canonical);
        }
        Ok(())
    }

    async fn get_active_turn(&self, session_key: &SessionKey) -> StorageResult<Option<LogicalTurn>> {
        let Some(turn_id) = self.active_by_session.get(&session_key.as_canonical()).map(|e| *e) else {
            return Ok(None);
        };
        self.get(turn_id).await
    }
}

/// A [`TurnStore`] wrapped in an `Arc` for sharing across workflow
/// instances.
pub type SharedTurnStore = Arc<dyn TurnStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use acf_core::TurnStatus;
    use chrono::Utc;

    fn key() -> SessionKey {
        SessionKey::new("acme", "bot", "user-1", "web").unwrap()
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let store = MemoryTurnStore::new();
        let turn = LogicalTurn::start(key(), "m1", Utc::now());
        let turn_id = turn.id;
        store.save(turn, FencingToken::from_raw(1)).await.unwrap();
        let fetched = store.get(turn_id).await.unwrap().unwrap();
        assert_eq!(fetched.id, turn_id);
    }

    #[tokio::test]
    async fn get_active_turn_finds_accumulating_turn() {
        let store = MemoryTurnStore::new();
        let turn = LogicalTurn::start(key(), "m1", Utc::now());
        let turn_id = turn.id;
        store.save(turn, FencingToken::from_raw(1)).await.unwrap();
        let active = store.get_active_turn(&key()).await.unwrap().unwrap();
        assert_eq!(active.id, turn_id);
    }

    #[tokio::test]
    async fn second_active_turn_for_same_session_is_rejected() {
        let store = MemoryTurnStore::new();
        let turn1 = LogicalTurn::start(key(), "m1", Utc::now());
        store.save(turn1, FencingToken::from_raw(1)).await.unwrap();

        let turn2 = LogicalTurn::start(key(), "m2", Utc::now());
        let err = store.save(turn2, FencingToken::from_raw(2)).await.unwrap_err();
        assert!(matches!(err, StorageError::UniquenessViolation(_)));
    }

    #[tokio::test]
    async fn completing_a_turn_clears_the_active_slot() {
        let store = MemoryTurnStore::new();
        let mut turn = LogicalTurn::start(key(), "m1", Utc::now());
        let turn_id = turn.id;
        store.save(turn.clone(), FencingToken::from_raw(1)).await.unwrap();

        turn.complete();
        assert_eq!(turn.status, TurnStatus::Complete);
        store.save(turn, FencingToken::from_raw(2)).await.unwrap();

        assert!(store.get_active_turn(&key()).await.unwrap().is_none());

        let turn2 = LogicalTurn::start(key(), "m2", Utc::now());
        store.save(turn2, FencingToken::from_raw(3)).await.unwrap();
        assert_ne!(store.get_active_turn(&key()).await.unwrap().unwrap().id, turn_id);
    }
}
