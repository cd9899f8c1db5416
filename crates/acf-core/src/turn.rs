//! The [`LogicalTurn`] data model — the "beat".

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::PhaseArtifact;
use crate::ids::{SessionKey, TurnGroupId, TurnId};
use crate::side_effect::SideEffect;

/// Lifecycle status of a [`LogicalTurn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// Collecting messages; not yet handed to the Brain.
    Accumulating,
    /// Handed to the Brain; pipeline is running.
    Processing,
    /// Reached commit. Terminal.
    Complete,
    /// Cancelled in favor of a successor turn in the same group, or
    /// abandoned on an unrecoverable error before any irreversible effect.
    /// Terminal.
    Superseded,
}

impl TurnStatus {
    /// Whether this status is one of the two "active" statuses that the
    /// turn store's uniqueness invariant (§4.3: at most one active turn per
    /// session key) is defined over.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Accumulating | Self::Processing)
    }

    /// Whether this status is terminal (no further mutation is legal).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Superseded)
    }
}

/// Why a turn's accumulation phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// The accumulation wait window elapsed with no new message.
    Timeout,
    /// The Brain predicted the user was finished mid-window.
    AiPredicted,
    /// The user sent an explicit completion signal (e.g. "send").
    ExplicitSignal,
    /// The total accumulation wall-time cap was exceeded.
    AbsorbedOverflow,
}

/// A snapshot of a session's scenario pointer, taken when a turn enters
/// PROCESSING, so the committed audit record can describe the state
/// transition the turn caused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioSnapshot {
    /// The active scenario at snapshot time.
    pub scenario_id: Option<String>,
    /// The active step at snapshot time.
    pub step_id: Option<String>,
}

/// One unit of coherent user intent: the "beat".
///
/// Only the workflow instance that holds the session mutex for
/// `session_key` may mutate a `LogicalTurn`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicalTurn {
    /// This turn's identifier.
    pub id: TurnId,
    /// The session this turn belongs to.
    pub session_key: SessionKey,
    /// Stable across a supersede chain; shared by every turn descended from
    /// the same original message.
    pub turn_group_id: TurnGroupId,
    /// Current lifecycle status.
    pub status: TurnStatus,
    /// Ordered message IDs absorbed into this turn.
    pub messages: Vec<String>,
    /// When the first message arrived.
    pub first_at: DateTime<Utc>,
    /// When the most recent message arrived.
    pub last_at: DateTime<Utc>,
    /// The Brain's confidence that accumulation is complete, in `[0, 1]`.
    pub completion_confidence: f32,
    /// Why accumulation ended, once it has.
    pub completion_reason: Option<CompletionReason>,
    /// Cached Brain phase outputs, keyed by phase number.
    pub phase_artifacts: HashMap<u32, PhaseArtifact>,
    /// Append-only ledger of side effects executed during this turn.
    pub side_effects: Vec<SideEffect>,
    /// Scenario pointer snapshot taken at PROCESSING entry.
    pub scenario_states_at_start: ScenarioSnapshot,
    /// The turn that superseded this one, if any.
    pub superseded_by: Option<TurnId>,
    /// The turn this one superseded, if any.
    pub supersedes: Option<TurnId>,
}

impl LogicalTurn {
    /// Start a brand-new turn (no predecessor) in ACCUMULATING with a single
    /// message.
    #[must_use]
    pub fn start(session_key: SessionKey, first_message_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: TurnId::new(),
            session_key,
            turn_group_id: TurnGroupId::new(),
            status: TurnStatus::Accumulating,
            messages: vec![first_message_id.into()],
            first_at: now,
            last_at: now,
            completion_confidence: 0.0,
            completion_reason: None,
            phase_artifacts: HashMap::new(),
            side_effects: Vec::new(),
            scenario_states_at_start: ScenarioSnapshot::default(),
            superseded_by: None,
            supersedes: None,
        }
    }

    /// Start a successor turn inheriting `turn_group_id` from `predecessor`,
    /// carrying forward its messages plus any new ones.
    ///
    /// Used both for SUPERSEDE (§4.6/§4.7) and for the "new turn from parked
    /// message" path after a QUEUE unblocks (§4.7 failure handling, scenario
    /// 3 in §8).
    #[must_use]
    pub fn succeed(predecessor: &LogicalTurn, messages: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: TurnId::new(),
            session_key: predecessor.session_key.clone(),
            turn_group_id: predecessor.turn_group_id,
            status: TurnStatus::Accumulating,
            messages,
            first_at: now,
            last_at: now,
            completion_confidence: 0.0,
            completion_reason: None,
            phase_artifacts: HashMap::new(),
            side_effects: Vec::new(),
            scenario_states_at_start: ScenarioSnapshot::default(),
            superseded_by: None,
            supersedes: Some(predecessor.id),
        }
    }

    /// Whether a newly arrived message may be absorbed into this turn.
    ///
    /// `status ∉ {COMPLETE, SUPERSEDED} ∧ ¬∃ se ∈ side_effects: se.policy =
    /// IRREVERSIBLE` (§4.9).
    #[must_use]
    pub fn can_absorb_message(&self) -> bool {
        !self.status.is_terminal()
            && !self
                .side_effects
                .iter()
                .any(|se| !se.policy.allows_supersede())
    }

    /// Whether this turn has recorded any irreversible side effect.
    ///
    /// Irreversibility is an absorbing state: once true, it stays true for
    /// the life of the turn, and the turn can never reach SUPERSEDED (§3).
    #[must_use]
    pub fn has_irreversible_effect(&self) -> bool {
        self.side_effects
            .iter()
            .any(|se| !se.policy.allows_supersede())
    }

    /// Append a message and bump `last_at`. Callers must check
    /// [`LogicalTurn::can_absorb_message`] first.
    pub fn absorb(&mut self, message_id: impl Into<String>, now: DateTime<Utc>) {
        self.messages.push(message_id.into());
        self.last_at = now;
    }

    /// Transition ACCUMULATING → PROCESSING, snapshotting the session's
    /// current scenario pointer and recording why accumulation ended.
    pub fn enter_processing(&mut self, reason: CompletionReason, snapshot: ScenarioSnapshot) {
        self.status = TurnStatus::Processing;
        self.completion_reason = Some(reason);
        self.scenario_states_at_start = snapshot;
    }

    /// Transition → COMPLETE. Terminal.
    pub fn complete(&mut self) {
        self.status = TurnStatus::Complete;
    }

    /// Transition → SUPERSEDED, linking to the successor. Terminal.
    ///
    /// Callers must never call this once
    /// [`LogicalTurn::has_irreversible_effect`] is true (§3 invariant 2);
    /// `acf-workflow` enforces this, this type only records the link.
    pub fn mark_superseded_by(&mut self, successor: TurnId) {
        self.status = TurnStatus::Superseded;
        self.superseded_by = Some(successor);
    }

    /// Record a new side effect on the ledger.
    pub fn record_side_effect(&mut self, effect: SideEffect) {
        self.side_effects.push(effect);
    }

    /// Insert or replace a phase artifact.
    pub fn set_phase_artifact(&mut self, artifact: PhaseArtifact) {
        self.phase_artifacts.insert(artifact.phase, artifact);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::side_effect::SideEffectPolicy;

    fn key() -> SessionKey {
        SessionKey::new("acme", "bot", "user-1", "web").unwrap()
    }

    #[test]
    fn fresh_turn_can_absorb() {
        let turn = LogicalTurn::start(key(), "m1", Utc::now());
        assert!(turn.can_absorb_message());
        assert!(!turn.has_irreversible_effect());
    }

    #[test]
    fn irreversible_effect_blocks_absorb_and_is_absorbing() {
        let mut turn = LogicalTurn::start(key(), "m1", Utc::now());
        turn.record_side_effect(SideEffect::new(
            "charge_card",
            SideEffectPolicy::Irreversible,
            2,
            Utc::now(),
        ));
        assert!(!turn.can_absorb_message());
        assert!(turn.has_irreversible_effect());

        // Still true after further (non-irreversible) effects: absorbing.
        turn.record_side_effect(SideEffect::new(
            "lookup_order",
            SideEffectPolicy::Pure,
            3,
            Utc::now(),
        ));
        assert!(turn.has_irreversible_effect());
    }

    #[test]
    fn terminal_status_blocks_absorb() {
        let mut turn = LogicalTurn::start(key(), "m1", Utc::now());
        turn.complete();
        assert!(!turn.can_absorb_message());
    }

    #[test]
    fn successor_inherits_turn_group_id() {
        let predecessor = LogicalTurn::start(key(), "m1", Utc::now());
        let successor = LogicalTurn::succeed(
            &predecessor,
            vec!["m1".to_string(), "m2".to_string()],
            Utc::now(),
        );
        assert_eq!(successor.turn_group_id, predecessor.turn_group_id);
        assert_eq!(successor.supersedes, Some(predecessor.id));
        assert_ne!(successor.id, predecessor.id);
    }
}
