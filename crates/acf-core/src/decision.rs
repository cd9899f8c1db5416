//! Turn-arrival decisions: what the workflow does with a newly arrived
//! message relative to the turn currently occupying a session.

use serde::{Deserialize, Serialize};

use crate::ids::TurnId;

/// What happens to a message that arrives while a turn is ACCUMULATING.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationDecision {
    /// The message is absorbed into the accumulating turn; the window
    /// resets.
    Absorb,
    /// The accumulation window or overflow cap elapsed; the turn moves to
    /// PROCESSING and the message starts a successor turn in the same group.
    CompleteAndSucceed,
}

/// The action the Brain (or the workflow's default policy, in the Brain's
/// absence) chooses when a message arrives while a turn is PROCESSING.
///
/// SUPERSEDE is legal only while
/// [`crate::turn::LogicalTurn::can_absorb_message`] holds for the
/// in-flight turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupersedeAction {
    /// Cancel the in-flight turn and start a fresh one in its place.
    Supersede,
    /// Let the in-flight turn run to completion, then absorb this message
    /// into the successor turn it spawns.
    Absorb,
    /// Park the message; it is delivered once the in-flight turn reaches a
    /// terminal status.
    Queue,
    /// Force the in-flight turn to complete immediately with its
    /// best-effort partial result (used when a hard deadline is hit).
    ForceComplete,
}

/// A decision made about a message that arrived mid-PROCESSING, together with
/// the turn it was decided against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupersedeDecision {
    /// The in-flight turn the decision concerns.
    pub in_flight_turn: TurnId,
    /// The chosen action.
    pub action: SupersedeAction,
    /// The Brain's confidence in this decision, in `[0, 1]`.
    pub confidence: f32,
}

impl SupersedeDecision {
    /// Build a decision, forcing [`SupersedeAction::Queue`] whenever the
    /// in-flight turn cannot currently be superseded or absorbed into —
    /// i.e. it already holds an irreversible side effect. This is the
    /// workflow-level enforcement of the §3/§4.9 absorbing-state invariant;
    /// a Brain may request SUPERSEDE but never receive it against a turn
    /// that cannot legally honor it.
    #[must_use]
    pub fn new(in_flight_turn: TurnId, action: SupersedeAction, confidence: f32, turn_can_absorb: bool) -> Self {
        let action = if !turn_can_absorb && matches!(action, SupersedeAction::Supersede | SupersedeAction::Absorb) {
            SupersedeAction::Queue
        } else {
            action
        };
        Self {
            in_flight_turn,
            action,
            confidence,
        }
    }
}

/// The overall decision the workflow makes about a single arriving message,
/// spanning both the ACCUMULATING and PROCESSING cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnDecision {
    /// The session has no active turn; start a new one.
    StartNew,
    /// The session's active turn is ACCUMULATING.
    Accumulation(AccumulationDecision),
    /// The session's active turn is PROCESSING.
    Supersede(SupersedeDecision),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supersede_forced_to_queue_when_turn_cannot_absorb() {
        let turn_id = TurnId::new();
        let decision = SupersedeDecision::new(turn_id, SupersedeAction::Supersede, 0.95, false);
        assert_eq!(decision.action, SupersedeAction::Queue);

        let decision = SupersedeDecision::new(turn_id, SupersedeAction::Absorb, 0.95, false);
        assert_eq!(decision.action, SupersedeAction::Queue);
    }

    #[test]
    fn supersede_honored_when_turn_can_absorb() {
        let turn_id = TurnId::new();
        let decision = SupersedeDecision::new(turn_id, SupersedeAction::Supersede, 0.95, true);
        assert_eq!(decision.action, SupersedeAction::Supersede);
    }

    #[test]
    fn force_complete_passes_through_regardless() {
        let turn_id = TurnId::new();
        let decision = SupersedeDecision::new(turn_id, SupersedeAction::ForceComplete, 0.5, false);
        assert_eq!(decision.action, SupersedeAction::ForceComplete);
    }
}
