//! Drives a session's [`LogicalTurnWorkflow`] to completion and, if it
//! hands back a successor turn, keeps driving that one too.
//!
//! `acf-workflow` deliberately never self-spawns (a single `run()` call
//! owns exactly one turn); this is the layer that turns a chain of
//! `Superseded`/`Committed { followup_turn: Some(_) }` outcomes into
//! however many sequential `run()` calls the chain actually needs.

use std::sync::Arc;

use acf_core::{Clock, SessionKey};
use acf_workflow::{LogicalTurnWorkflow, WorkflowOutcome};
use tracing::{error, info, warn};

use crate::health::HealthTracker;

/// Drive `session_key` through `workflow` until no further turn is queued
/// up for it.
///
/// Spawned as its own task per [`acf_gateway::TurnDecision::StartNew`]
/// decision; never awaited by the caller, so a slow or stuck session never
/// blocks ingestion of the next one.
pub async fn drive_session<C: Clock + 'static>(
    workflow: Arc<LogicalTurnWorkflow<C>>,
    health: Arc<HealthTracker>,
    mut session_key: SessionKey,
) {
    loop {
        health.record_turn_started();
        let outcome = match workflow.run(session_key.clone()).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(session_key = %session_key.as_canonical(), error = %err, "workflow run returned an error");
                return;
            },
        };

        match outcome {
            WorkflowOutcome::Committed {
                turn_id,
                followup_turn: Some(successor),
                ..
            } => {
                info!(
                    %turn_id,
                    successor_turn_id = %successor.id,
                    session_key = %session_key.as_canonical(),
                    "turn committed with queued followup messages; driving successor turn"
                );
                session_key = successor.session_key.clone();
            },
            WorkflowOutcome::Committed { turn_id, followup_turn: None, .. } => {
                info!(%turn_id, session_key = %session_key.as_canonical(), "turn committed, session idle");
                return;
            },
            WorkflowOutcome::Superseded { predecessor, successor } => {
                info!(
                    %predecessor,
                    successor_turn_id = %successor.id,
                    session_key = %session_key.as_canonical(),
                    "turn superseded; driving successor turn"
                );
                session_key = successor.session_key.clone();
            },
            WorkflowOutcome::LostMutexRace { session_key: lost_key } => {
                warn!(session_key = %lost_key.as_canonical(), "lost the race to acquire the session mutex; another instance owns this turn");
                return;
            },
            WorkflowOutcome::Aborted { turn_id, reason } => {
                warn!(%turn_id, session_key = %session_key.as_canonical(), reason, "turn aborted");
                return;
            },
        }
    }
}
