//! The [`Session`] data model: persistent, mutable, single-writer-per-key.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SessionKey;

/// Lifecycle status of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Conversation is live with no turn currently accumulating or running.
    Active,
    /// No recent activity; a fresh message re-activates the session.
    Idle,
    /// A turn is currently being accumulated or run against this session.
    Processing,
    /// The in-flight turn was interrupted (superseded or errored) and a
    /// replacement is starting.
    Interrupted,
    /// The session has been explicitly ended.
    Closed,
}

/// One entry in a session's scenario step history.
///
/// Appended only after a turn's successful COMMIT (§3 invariant: "scenario
/// transitions appear in `step_history` only after a successful COMMIT").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepHistoryEntry {
    /// The scenario step entered.
    pub step_id: String,
    /// When it was entered.
    pub entered_at: DateTime<Utc>,
    /// The turn number (session-relative) that caused the transition.
    pub turn_number: u64,
    /// Why the transition happened (rule fire, explicit signal, etc.).
    pub reason: String,
    /// The Brain's confidence in this transition, in `[0, 1]`.
    pub confidence: f32,
}

/// A conversation session: the persistent, mutable state a [`SessionKey`]
/// maps to.
///
/// Only the workflow instance holding the session mutex for this key may
/// mutate a `Session`; everyone else reads through the session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The composite key identifying this session.
    pub session_key: SessionKey,
    /// Tenant this session belongs to.
    pub tenant_id: String,
    /// Agent this session is conversing with.
    pub agent_id: String,
    /// The human (or system) on the other end.
    pub interlocutor_id: String,
    /// The channel this session is bound to.
    pub channel: String,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// The scenario currently driving the conversation, if any.
    pub active_scenario_id: Option<String>,
    /// The step within that scenario.
    pub active_step_id: Option<String>,
    /// The scenario's version at the time it became active.
    pub active_scenario_version: Option<String>,
    /// Ordered history of scenario step transitions.
    pub step_history: Vec<StepHistoryEntry>,
    /// Opaque conversation variables.
    pub variables: HashMap<String, serde_json::Value>,
    /// When each variable was last updated.
    pub variable_updated_at: HashMap<String, DateTime<Utc>>,
    /// Count of times each rule has fired.
    pub rule_fires: HashMap<String, u64>,
    /// The turn number each rule last fired on.
    pub rule_last_fire_turn: HashMap<String, u64>,
    /// Monotonically nondecreasing count of turns committed on this session.
    pub turn_count: u64,
    /// The config version this session was last evaluated under.
    pub config_version: String,
    /// A migration waiting to apply the next time the session is processed.
    pub pending_migration: Option<String>,
    /// When the session was first created.
    pub created_at: DateTime<Utc>,
    /// When the session last saw activity.
    pub last_activity_at: DateTime<Utc>,
}

impl Session {
    /// Create a brand-new, empty session for `session_key` at `now`.
    #[must_use]
    pub fn new(session_key: SessionKey, now: DateTime<Utc>) -> Self {
        let tenant_id = session_key.tenant_id().to_string();
        let agent_id = session_key.agent_id().to_string();
        let interlocutor_id = session_key.interlocutor_id().to_string();
        let channel = session_key.channel().to_string();
        Self {
            session_key,
            tenant_id,
            agent_id,
            interlocutor_id,
            channel,
            status: SessionStatus::Active,
            active_scenario_id: None,
            active_step_id: None,
            active_scenario_version: None,
            step_history: Vec::new(),
            variables: HashMap::new(),
            variable_updated_at: HashMap::new(),
            rule_fires: HashMap::new(),
            rule_last_fire_turn: HashMap::new(),
            turn_count: 0,
            config_version: String::new(),
            pending_migration: None,
            created_at: now,
            last_activity_at: now,
        }
    }

    /// Set a conversation variable, recording when it changed.
    pub fn set_variable(&mut self, key: impl Into<String>, value: serde_json::Value, now: DateTime<Utc>) {
        let key = key.into();
        self.variable_updated_at.insert(key.clone(), now);
        self.variables.insert(key, value);
    }

    /// Record a rule firing on the given turn number.
    pub fn record_rule_fire(&mut self, rule_id: impl Into<String>, turn_number: u64) {
        let rule_id = rule_id.into();
        *self.rule_fires.entry(rule_id.clone()).or_insert(0) += 1;
        self.rule_last_fire_turn.insert(rule_id, turn_number);
    }

    /// Append a step-history entry and update the active scenario pointer.
    ///
    /// Call this only from the commit step of the workflow, after a turn has
    /// successfully reached COMMIT — never speculatively during accumulation
    /// or pipeline execution.
    pub fn commit_scenario_transition(
        &mut self,
        scenario_id: impl Into<String>,
        scenario_version: impl Into<String>,
        step_id: impl Into<String>,
        reason: impl Into<String>,
        confidence: f32,
        now: DateTime<Utc>,
    ) {
        let step_id = step_id.into();
        self.active_scenario_id = Some(scenario_id.into());
        self.active_scenario_version = Some(scenario_version.into());
        self.active_step_id = Some(step_id.clone());
        self.turn_count += 1;
        self.last_activity_at = now;
        self.step_history.push(StepHistoryEntry {
            step_id,
            entered_at: now,
            turn_number: self.turn_count,
            reason: reason.into(),
            confidence,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SessionKey {
        SessionKey::new("acme", "bot", "user-1", "web").unwrap()
    }

    #[test]
    fn new_session_is_active_with_no_history() {
        let now = Utc::now();
        let session = Session::new(key(), now);
        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.step_history.is_empty());
        assert_eq!(session.turn_count, 0);
    }

    #[test]
    fn turn_count_is_monotonic_across_commits() {
        let now = Utc::now();
        let mut session = Session::new(key(), now);
        session.commit_scenario_transition("s1", "v1", "step-a", "timeout", 0.9, now);
        session.commit_scenario_transition("s1", "v1", "step-b", "timeout", 0.8, now);
        assert_eq!(session.turn_count, 2);
        assert_eq!(session.step_history.len(), 2);
        assert_eq!(session.step_history[0].turn_number, 1);
        assert_eq!(session.step_history[1].turn_number, 2);
    }

    #[test]
    fn variable_update_records_timestamp() {
        let now = Utc::now();
        let mut session = Session::new(key(), now);
        session.set_variable("k", serde_json::json!("v"), now);
        assert!(session.variable_updated_at.contains_key("k"));
    }
}
