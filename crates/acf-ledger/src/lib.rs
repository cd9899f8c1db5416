//! ACF Ledger (C9) — the tool side-effect policy table and the per-turn
//! side-effect ledger, plus reverse-order compensation (§4.9, §4.7 failure
//! handling).

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

use std::collections::HashMap;

use acf_core::{LogicalTurn, SideEffect, SideEffectPolicy};
use chrono::{DateTime, Utc};

/// Declares the reversibility class of each tool a deployment exposes.
///
/// Built from configuration (`acf-config`); absence of a declaration is
/// treated as [`SideEffectPolicy::Irreversible`] — fail-closed, per §4.9 —
/// and logged as a `warn` so an undeclared tool does not silently block
/// every future supersede for a session.
#[derive(Debug, Clone, Default)]
pub struct ToolPolicyTable {
    policies: HashMap<String, SideEffectPolicy>,
}

impl ToolPolicyTable {
    /// An empty table. Every lookup against it fails closed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a tool's policy, overwriting any prior declaration.
    pub fn declare(&mut self, tool_name: impl Into<String>, policy: SideEffectPolicy) -> &mut Self {
        self.policies.insert(tool_name.into(), policy);
        self
    }

    /// Look up a tool's declared policy, fail-closed to
    /// [`SideEffectPolicy::Irreversible`] on absence.
    #[must_use]
    pub fn lookup(&self, tool_name: &str) -> SideEffectPolicy {
        match self.policies.get(tool_name) {
            Some(policy) => *policy,
            None => {
                tracing::warn!(tool_name, "no side-effect policy declared; treating as irreversible (fail-closed)");
                SideEffectPolicy::Irreversible
            }
        }
    }

    /// Whether a tool has an explicit declaration (as opposed to falling
    /// back to the fail-closed default).
    #[must_use]
    pub fn is_declared(&self, tool_name: &str) -> bool {
        self.policies.contains_key(tool_name)
    }
}

/// Appends tool invocations to a turn's side-effect ledger.
///
/// The ledger itself holds no state beyond what is already on the
/// [`LogicalTurn`]; this type exists to keep the policy-lookup-then-append
/// sequence in one place and to carry the reverse-order compensation logic
/// used by the workflow's failure path.
#[derive(Debug, Default)]
pub struct SideEffectLedger;

impl SideEffectLedger {
    /// Record a tool invocation on `turn`, looking up its policy in
    /// `table` (fail-closed) and appending a [`SideEffect`] entry.
    ///
    /// Returns the recorded effect so the caller can, e.g., attach it to an
    /// audit record without re-reading the turn.
    pub fn record(
        turn: &mut LogicalTurn,
        table: &ToolPolicyTable,
        tool_name: impl Into<String>,
        phase: u32,
        now: DateTime<Utc>,
    ) -> SideEffect {
        let tool_name = tool_name.into();
        let policy = table.lookup(&tool_name);
        let effect = SideEffect::new(tool_name, policy, phase, now);
        turn.record_side_effect(effect.clone());
        effect
    }
}

/// The outcome of attempting to compensate one side effect.
#[derive(Debug, Clone)]
pub enum CompensationOutcome {
    /// The effect was [`SideEffectPolicy::Compensatable`] and the
    /// compensator ran successfully.
    Compensated {
        /// The effect that was compensated.
        tool_name: String,
    },
    /// The effect did not require compensation (it was
    /// [`SideEffectPolicy::Pure`] or [`SideEffectPolicy::Idempotent`]).
    Skipped {
        /// The effect that was skipped.
        tool_name: String,
    },
    /// The effect was compensatable but the compensator itself failed.
    /// This surfaces as a terminal audit event per §7; it does not retry.
    Failed {
        /// The effect whose compensation failed.
        tool_name: String,
        /// Why the compensator failed.
        reason: String,
    },
}

/// Attempt compensation for every [`SideEffectPolicy::Compensatable`]
/// effect on `turn`, in reverse chronological order, per §4.7's failure
/// handling: "attempts compensation for COMPENSATABLE effects in reverse
/// order".
///
/// `compensator` is invoked once per compensatable effect; it is the
/// caller's bridge to the actual tool compensation action (ACF does not
/// know how to undo a tool call, only that it declared itself undoable).
pub fn compensate_in_reverse(
    turn: &LogicalTurn,
    mut compensator: impl FnMut(&SideEffect) -> Result<(), String>,
) -> Vec<CompensationOutcome> {
    turn.side_effects
        .iter()
        .rev()
        .map(|effect| match effect.policy {
            SideEffectPolicy::Compensatable => match compensator(effect) {
                Ok(()) => CompensationOutcome::Compensated {
                    tool_name: effect.tool_name.clone(),
                },
                Err(reason) => CompensationOutcome::Failed {
                    tool_name: effect.tool_name.clone(),
                    reason,
                },
            },
            _ => CompensationOutcome::Skipped {
                tool_name: effect.tool_name.clone(),
            },
        })
        .collect()
}
