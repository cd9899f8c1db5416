//! What a `LogicalTurnWorkflow` run hands back to its supervisor.

use acf_channel::OutboundEnvelope;
use acf_core::{LogicalTurn, SessionKey, TurnId};

/// The result of driving one [`crate::workflow::LogicalTurnWorkflow`] run to
/// its end.
///
/// A supervisor (outside this crate, in `acf-daemon`) reads this to decide
/// whether to spawn a fresh workflow instance for a successor turn.
#[derive(Debug, Clone)]
pub enum WorkflowOutcome {
    /// The turn reached commit. `followup_turn`, if present, is a
    /// successor turn the supervisor should immediately spawn a new
    /// workflow for — seeded from the session's overflow queue or from a
    /// message a `Queue` decision deferred while this turn ran.
    Committed {
        /// The turn that committed.
        turn_id: TurnId,
        /// The response delivered to the channel adapter.
        outbound: OutboundEnvelope,
        /// A successor turn already ACCUMULATING, waiting to be run.
        followup_turn: Option<LogicalTurn>,
    },
    /// The turn was cancelled in favor of a successor in the same group.
    /// The supervisor must spawn a workflow for `successor`.
    Superseded {
        /// The turn that was cancelled.
        predecessor: TurnId,
        /// Its replacement, already persisted as ACCUMULATING.
        successor: LogicalTurn,
    },
    /// `acquire_mutex` lost the race to an incumbent holder. No state was
    /// touched; the caller's turn was abandoned in favor of whatever
    /// workflow instance currently holds the session.
    LostMutexRace {
        /// The session this would-be turn belonged to.
        session_key: SessionKey,
    },
    /// The run failed before reaching commit. The turn was driven to a
    /// terminal state (COMPLETE if an irreversible effect had already been
    /// recorded and SUPERSEDED was no longer legal, SUPERSEDED otherwise) so
    /// the session's active-turn slot is free again.
    Aborted {
        /// The turn that failed.
        turn_id: TurnId,
        /// Why it failed.
        reason: String,
    },
}
