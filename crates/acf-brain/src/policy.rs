//! Default supersede/absorb/queue policy, and the per-agent override table.

use std::collections::HashMap;

use acf_core::SupersedeAction;

/// The signals the default policy consults when a message arrives against
/// a PROCESSING turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyInputs {
    /// Whether the turn has recorded any side effect yet (any policy, not
    /// just IRREVERSIBLE).
    pub has_side_effects: bool,
    /// Fraction of the Brain's planned phases already run, in `[0, 1]`.
    pub phases_done_ratio: f32,
    /// Whether the turn holds PURE artifacts worth keeping.
    pub has_pure_artifacts: bool,
    /// Whether the Brain judges the new message to continue the same topic.
    pub same_topic: bool,
    /// Whether the turn has committed a COMPENSATABLE or IDEMPOTENT effect.
    pub has_compensatable_or_idempotent_effects: bool,
    /// The Brain's estimate of phases remaining.
    pub phases_remaining_estimate: f32,
}

/// The decision-table default: evaluated top to bottom, first match wins.
#[must_use]
pub fn default_action(inputs: PolicyInputs) -> SupersedeAction {
    if inputs.phases_remaining_estimate < 1.0 {
        return SupersedeAction::ForceComplete;
    }
    if inputs.has_compensatable_or_idempotent_effects {
        return SupersedeAction::Queue;
    }
    if inputs.has_pure_artifacts && inputs.same_topic {
        return SupersedeAction::Absorb;
    }
    if !inputs.has_side_effects && inputs.phases_done_ratio < 0.5 {
        return SupersedeAction::Supersede;
    }
    SupersedeAction::Queue
}

/// Per-agent overrides of the default policy.
///
/// Most agents use [`default_action`] unmodified; an operator may pin an
/// agent to a fixed action (e.g. always QUEUE for a compliance-sensitive
/// agent) regardless of the computed signals.
#[derive(Debug, Default)]
pub struct PolicyTable {
    overrides: HashMap<String, SupersedeAction>,
}

impl PolicyTable {
    /// An empty table: every agent uses [`default_action`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin `agent_id` to a fixed action, bypassing [`default_action`].
    pub fn pin(&mut self, agent_id: impl Into<String>, action: SupersedeAction) {
        self.overrides.insert(agent_id.into(), action);
    }

    /// Resolve the action for `agent_id` given the current signals.
    #[must_use]
    pub fn resolve(&self, agent_id: &str, inputs: PolicyInputs) -> SupersedeAction {
        self.overrides.get(agent_id).copied().unwrap_or_else(|| default_action(inputs))
    }
}
