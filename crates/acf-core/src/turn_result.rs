//! The outcome a completed or abandoned pipeline run hands back to the
//! workflow's commit step.

use serde::{Deserialize, Serialize};

use crate::decision::SupersedeAction;
use crate::ids::TurnId;
use crate::turn::ScenarioSnapshot;

/// A turn that did not reach commit — either because it was superseded
/// before committing any effect, or because the pipeline returned an error
/// with no irreversible side effect recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterruptedTurn {
    /// The turn that was interrupted.
    pub turn_id: TurnId,
    /// Human-readable reason (e.g. `"superseded by <turn>"`, `"pipeline
    /// error: <message>"`).
    pub reason: String,
    /// The turn that superseded this one, if that was the cause.
    pub superseded_by: Option<TurnId>,
    /// The last phase the Brain completed before the probe returned true.
    pub last_phase: u32,
    /// The action the Brain's interrupt handling recommends the workflow
    /// take (subject to the workflow's own irreversibility check).
    pub recommended_action: SupersedeAction,
    /// The message id whose arrival caused the probe to return true, if
    /// the interrupt was message-driven rather than an internal error.
    pub interrupt_message_id: Option<String>,
}

/// What the Brain pipeline hands back for a single [`crate::LogicalTurn`]
/// run, consumed by the workflow's `commit_and_respond` step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnResult {
    /// The turn ran to completion and is ready to commit.
    Completed {
        /// The turn that completed.
        turn_id: TurnId,
        /// The scenario transition to apply on commit, if any.
        scenario_transition: Option<ScenarioSnapshot>,
        /// The reply text (or structured payload) to send back, if any.
        reply: Option<serde_json::Value>,
        /// The Brain's confidence in this outcome, in `[0, 1]`.
        confidence: f32,
    },
    /// The turn did not reach commit.
    Interrupted(InterruptedTurn),
}

impl TurnResult {
    /// The turn ID this result concerns, regardless of variant.
    #[must_use]
    pub fn turn_id(&self) -> TurnId {
        match self {
            Self::Completed { turn_id, .. } => *turn_id,
            Self::Interrupted(interrupted) => interrupted.turn_id,
        }
    }

    /// Whether this result represents a successful commit.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_id_is_reachable_from_either_variant() {
        let id = TurnId::new();
        let completed = TurnResult::Completed {
            turn_id: id,
            scenario_transition: None,
            reply: None,
            confidence: 0.9,
        };
        assert_eq!(completed.turn_id(), id);
        assert!(completed.is_completed());

        let interrupted = TurnResult::Interrupted(InterruptedTurn {
            turn_id: id,
            reason: "superseded".to_string(),
            superseded_by: None,
            last_phase: 0,
            recommended_action: SupersedeAction::Supersede,
            interrupt_message_id: None,
        });
        assert_eq!(interrupted.turn_id(), id);
        assert!(!interrupted.is_completed());
    }
}
