//! The `Brain` capability boundary.
//!
//! ACF ships no real cognitive engine; [`process_turn`](Brain::process_turn)
//! is implemented by whatever rule-matching/retrieval/generation pipeline a
//! deployment plugs in. [`DeterministicBrain`] is a minimal in-tree
//! reference implementation so the workspace builds and integration tests
//! can run a turn through ACF end to end.

use std::collections::HashMap;

use acf_accumulator::PipelineHint;
use acf_core::{Fingerprint, LogicalTurn, PhaseArtifact, ScenarioSnapshot, TurnResult};
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::policy::{default_action, PolicyInputs};
use crate::probe::InterruptProbe;

/// The pluggable cognitive engine ACF drives through a turn.
#[async_trait]
pub trait Brain: Send + Sync {
    /// Run (or resume) the phase pipeline for `turn`.
    ///
    /// `reusable_artifacts` holds phase artifacts carried forward from a
    /// predecessor turn in the same supersede chain; the Brain should skip
    /// re-running any phase whose artifact is still reusable under current
    /// inputs/dependencies (see [`PhaseArtifact::is_reusable`]).
    async fn process_turn(
        &self,
        turn: &LogicalTurn,
        probe: &dyn InterruptProbe,
        reusable_artifacts: &HashMap<u32, PhaseArtifact>,
    ) -> TurnResult;

    /// Summarize this completed turn into a hint the Accumulator should
    /// weigh for the *next* turn's wait-window calculation (§4.5 "pipeline
    /// hint from the previous turn").
    async fn summarize_for_followup(&self, turn: &LogicalTurn) -> Option<PipelineHint>;
}

/// A minimal, deterministic reference [`Brain`]: runs a fixed number of
/// phases, producing a trivial echo artifact per phase, and checks the
/// probe between phases. Used by tests and the demo binary; not a
/// production cognitive engine.
#[derive(Debug, Clone)]
pub struct DeterministicBrain {
    phase_count: u32,
}

impl DeterministicBrain {
    /// Build a brain that runs `phase_count` phases per turn before
    /// completing.
    #[must_use]
    pub fn new(phase_count: u32) -> Self {
        Self {
            phase_count: phase_count.max(1),
        }
    }
}

impl Default for DeterministicBrain {
    fn default() -> Self {
        Self::new(2)
    }
}

#[async_trait]
impl Brain for DeterministicBrain {
    async fn process_turn(
        &self,
        turn: &LogicalTurn,
        probe: &dyn InterruptProbe,
        reusable_artifacts: &HashMap<u32, PhaseArtifact>,
    ) -> TurnResult {
        let dependency_fp = Fingerprint::of(b"deterministic-brain-v1");

        for phase in 0..self.phase_count {
            let input_fp = Fingerprint::of_json(&turn.messages).unwrap_or_else(|| Fingerprint::of(b""));

            let reused = reusable_artifacts
                .get(&phase)
                .is_some_and(|artifact| artifact.is_reusable(input_fp, dependency_fp));

            if !reused {
                debug!(turn_id = %turn.id, phase, "running phase");
            }

            if phase + 1 < self.phase_count && probe.should_interrupt() {
                let phases_done_ratio = f64::from(phase + 1) / f64::from(self.phase_count);
                let action = default_action(PolicyInputs {
                    has_side_effects: !turn.side_effects.is_empty(),
                    phases_done_ratio: phases_done_ratio as f32,
                    has_pure_artifacts: phase > 0,
                    same_topic: true,
                    has_compensatable_or_idempotent_effects: turn
                        .side_effects
                        .iter()
                        .any(|se| matches!(se.policy, acf_core::SideEffectPolicy::Compensatable | acf_core::SideEffectPolicy::Idempotent)),
                    phases_remaining_estimate: f64::from(self.phase_count - phase - 1) as f32,
                });

                return TurnResult::Interrupted(acf_core::InterruptedTurn {
                    turn_id: turn.id,
                    reason: format!("probe tripped after phase {phase}"),
                    superseded_by: None,
                    last_phase: phase,
                    recommended_action: action,
                    interrupt_message_id: turn.messages.last().cloned(),
                });
            }
        }

        TurnResult::Completed {
            turn_id: turn.id,
            scenario_transition: Some(ScenarioSnapshot::default()),
            reply: Some(serde_json::json!({ "text": "acknowledged" })),
            confidence: 0.99,
        }
    }

    async fn summarize_for_followup(&self, _turn: &LogicalTurn) -> Option<PipelineHint> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{FlagProbe, NeverInterrupt};
    use acf_core::SessionKey;

    fn sample_turn() -> LogicalTurn {
        let key = SessionKey::new("acme", "bot", "user", "web").unwrap();
        let mut turn = LogicalTurn::start(key, "m1", Utc::now());
        turn.absorb("m2", Utc::now());
        turn
    }

    #[tokio::test]
    async fn completes_when_probe_never_trips() {
        let brain = DeterministicBrain::new(2);
        let turn = sample_turn();
        let result = brain.process_turn(&turn, &NeverInterrupt, &HashMap::new()).await;
        assert!(result.is_completed());
    }

    #[tokio::test]
    async fn interrupts_when_probe_is_tripped_before_last_phase() {
        let brain = DeterministicBrain::new(3);
        let turn = sample_turn();
        let probe = FlagProbe::new();
        probe.trip();

        let result = brain.process_turn(&turn, &probe, &HashMap::new()).await;
        match result {
            TurnResult::Interrupted(interrupted) => {
                assert_eq!(interrupted.last_phase, 0);
            },
            TurnResult::Completed { .. } => panic!("expected an interruption"),
        }
    }

    #[tokio::test]
    async fn single_phase_brain_never_has_an_interrupt_checkpoint() {
        let brain = DeterministicBrain::new(1);
        let turn = sample_turn();
        let probe = FlagProbe::new();
        probe.trip();

        let result = brain.process_turn(&turn, &probe, &HashMap::new()).await;
        assert!(result.is_completed());
    }
}
