//! Side-effect policy and the per-turn side-effect ledger entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declared reversibility class of a tool.
///
/// Tools are declared out-of-band with exactly one policy; absence of a
/// declaration is treated as [`SideEffectPolicy::Irreversible`] (fail-closed
/// — see `acf-ledger`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffectPolicy {
    /// No observable effect outside the turn (e.g. retrieval, classification).
    Pure,
    /// Repeatable without changing the outcome (e.g. `set_status(x)`).
    Idempotent,
    /// Has an effect, but a compensating action can undo it.
    Compensatable,
    /// Cannot be undone once executed (e.g. `charge_card`).
    Irreversible,
}

impl SideEffectPolicy {
    /// Whether a turn holding only effects of this policy may still be
    /// safely superseded.
    #[must_use]
    pub fn allows_supersede(self) -> bool {
        !matches!(self, Self::Irreversible)
    }
}

/// A single recorded side effect on a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideEffect {
    /// The tool that was invoked.
    pub tool_name: String,
    /// Its declared reversibility class.
    pub policy: SideEffectPolicy,
    /// When it executed.
    pub executed_at: DateTime<Utc>,
    /// The Brain phase it executed in.
    pub phase: u32,
    /// A reference usable to compensate this effect, if
    /// [`SideEffectPolicy::Compensatable`].
    pub compensation_ref: Option<String>,
}

impl SideEffect {
    /// Record a new side effect at the given time.
    #[must_use]
    pub fn new(
        tool_name: impl Into<String>,
        policy: SideEffectPolicy,
        phase: u32,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            policy,
            executed_at,
            phase,
            compensation_ref: None,
        }
    }

    /// Attach a compensation reference (only meaningful for
    /// [`SideEffectPolicy::Compensatable`] effects).
    #[must_use]
    pub fn with_compensation_ref(mut self, compensation_ref: impl Into<String>) -> Self {
        self.compensation_ref = Some(compensation_ref.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_irreversible_blocks_supersede() {
        assert!(SideEffectPolicy::Pure.allows_supersede());
        assert!(SideEffectPolicy::Idempotent.allows_supersede());
        assert!(SideEffectPolicy::Compensatable.allows_supersede());
        assert!(!SideEffectPolicy::Irreversible.allows_supersede());
    }
}
