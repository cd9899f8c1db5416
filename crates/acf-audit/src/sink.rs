//! The audit sink capability: append-only storage of committed
//! [`TurnRecord`]s, indexed by turn and by session.

use acf_core::{SessionKey, TurnId};
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use crate::error::{AuditError, AuditResult};
use crate::record::TurnRecord;

/// Append-only storage for committed turn records.
///
/// A record is written exactly once per turn, at commit. Implementations
/// must reject a second write for a turn id already present rather than
/// silently overwriting it — the ledger is a fact log, not a cache.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append a record. Fails if a record already exists for this turn.
    async fn record(&self, record: TurnRecord) -> AuditResult<()>;

    /// Fetch the record for a single turn, if committed.
    async fn get(&self, turn_id: TurnId) -> AuditResult<Option<TurnRecord>>;

    /// List every committed record for a session, oldest first.
    async fn list_by_session(&self, session_key: &SessionKey) -> AuditResult<Vec<TurnRecord>>;
}

/// In-memory [`AuditSink`], suitable for tests and for a single-process
/// deployment without a durable audit requirement.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    by_turn: DashMap<TurnId, TurnRecord>,
    by_session: DashMap<SessionKey, Vec<TurnId>>,
}

impl MemoryAuditSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, record: TurnRecord) -> AuditResult<()> {
        if self.by_turn.contains_key(&record.turn_id) {
            return Err(AuditError::AlreadyCommitted {
                turn_id: record.turn_id.to_string(),
            });
        }

        info!(
            turn_id = %record.turn_id,
            turn_group_id = %record.turn_group_id,
            message_count = record.message_sequence.len(),
            interruption_count = record.interruptions.len(),
            "committing turn audit record"
        );

        let turn_id = record.turn_id;
        let session_key = record.session_key.clone();
        self.by_turn.insert(turn_id, record);
        self.by_session.entry(session_key).or_default().push(turn_id);
        Ok(())
    }

    async fn get(&self, turn_id: TurnId) -> AuditResult<Option<TurnRecord>> {
        Ok(self.by_turn.get(&turn_id).map(|r| r.clone()))
    }

    async fn list_by_session(&self, session_key: &SessionKey) -> AuditResult<Vec<TurnRecord>> {
        let Some(turn_ids) = self.by_session.get(session_key) else {
            return Ok(Vec::new());
        };
        Ok(turn_ids
            .iter()
            .filter_map(|id| self.by_turn.get(id).map(|r| r.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acf_core::{ScenarioSnapshot, SessionKey, TurnGroupId};
    use chrono::Utc;

    fn sample_session_key() -> SessionKey {
        SessionKey::new("tenant-a", "agent-a", "user-a", "web").unwrap()
    }

    fn sample_record(turn_id: TurnId) -> TurnRecord {
        TurnRecord {
            session_key: sample_session_key(),
            turn_id,
            turn_group_id: TurnGroupId::new(),
            message_sequence: vec!["m1".to_string()],
            superseded_by: None,
            interruptions: Vec::new(),
            phase_artifact_summaries: Vec::new(),
            side_effects: Vec::new(),
            latency_ms: 42,
            tokens_used: Some(100),
            scenario_before: ScenarioSnapshot::default(),
            scenario_after: ScenarioSnapshot::default(),
            committed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn record_then_get_round_trips() {
        let sink = MemoryAuditSink::new();
        let turn_id = TurnId::new();
        sink.record(sample_record(turn_id)).await.unwrap();

        let fetched = sink.get(turn_id).await.unwrap().unwrap();
        assert_eq!(fetched.turn_id, turn_id);
        assert_eq!(fetched.latency_ms, 42);
    }

    #[tokio::test]
    async fn a_second_record_for_the_same_turn_is_rejected() {
        let sink = MemoryAuditSink::new();
        let turn_id = TurnId::new();
        sink.record(sample_record(turn_id)).await.unwrap();

        let err = sink.record(sample_record(turn_id)).await.unwrap_err();
        assert!(matches!(err, AuditError::AlreadyCommitted { .. }));
    }

    #[tokio::test]
    async fn missing_turn_returns_none() {
        let sink = MemoryAuditSink::new();
        assert!(sink.get(TurnId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_by_session_returns_only_that_sessions_records() {
        let sink = MemoryAuditSink::new();
        let key = sample_session_key();
        let other_key = SessionKey::new("tenant-a", "agent-a", "user-b", "web").unwrap();

        let turn_a = TurnId::new();
        let turn_b = TurnId::new();
        let turn_c = TurnId::new();

        let mut record_a = sample_record(turn_a);
        record_a.session_key = key.clone();
        sink.record(record_a).await.unwrap();

        let mut record_b = sample_record(turn_b);
        record_b.session_key = key.clone();
        sink.record(record_b).await.unwrap();

        let mut record_c = sample_record(turn_c);
        record_c.session_key = other_key;
        sink.record(record_c).await.unwrap();

        let records = sink.list_by_session(&key).await.unwrap();
        assert_eq!(records.len(), 2);
    }
}
