//! The committed, append-only fact recorded for every completed turn.

use acf_core::{ScenarioSnapshot, SessionKey, SideEffect, TurnGroupId, TurnId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A brief, audit-safe summary of a phase artifact: just enough to show
/// what ran and whether it was reused, not the artifact's raw data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseArtifactSummary {
    /// The phase number this summary describes.
    pub phase: u32,
    /// Whether the phase's artifact was reused from a prior turn rather
    /// than recomputed.
    pub reused: bool,
}

/// A single phase-probe interruption observed while running a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interruption {
    /// The last phase that completed before the interrupt was observed.
    pub last_phase: u32,
    /// The action the Brain's `SupersedeDecision` recommended.
    pub action: String,
    /// The message id whose arrival triggered the probe to return true.
    pub interrupt_message_id: Option<String>,
}

/// The audit fact committed for a turn, per the commit contract of
/// `commit_and_respond`: turn identity, the messages it coalesced,
/// interruptions observed along the way, and the scenario transition it
/// caused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    /// The session this turn belongs to.
    pub session_key: SessionKey,
    /// The turn this record describes. Doubles as the beat id.
    pub turn_id: TurnId,
    /// The supersede/absorb chain this turn belongs to.
    pub turn_group_id: TurnGroupId,
    /// Message ids coalesced into this turn, in arrival order.
    pub message_sequence: Vec<String>,
    /// Set if this turn was itself later superseded (should be `None` for
    /// any turn that reached commit, kept for completeness of the record
    /// shape).
    pub superseded_by: Option<TurnId>,
    /// Interruptions observed while running the turn's pipeline.
    pub interruptions: Vec<Interruption>,
    /// Summaries of every phase artifact touched.
    pub phase_artifact_summaries: Vec<PhaseArtifactSummary>,
    /// Side effects executed over the life of the turn.
    pub side_effects: Vec<SideEffect>,
    /// Wall-clock time from turn creation to commit, in milliseconds.
    pub latency_ms: u64,
    /// Tokens consumed by the Brain while producing this turn's response,
    /// if the Brain reports usage.
    pub tokens_used: Option<u64>,
    /// Scenario pointer snapshot at PROCESSING entry.
    pub scenario_before: ScenarioSnapshot,
    /// Scenario pointer snapshot at commit.
    pub scenario_after: ScenarioSnapshot,
    /// When this record was committed.
    pub committed_at: DateTime<Utc>,
}
