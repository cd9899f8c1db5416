//! Phase artifacts: cached intermediate Brain output, reusable across turns
//! when their fingerprints still match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A deterministic fingerprint over normalized inputs or dependency
/// versions, used to decide whether a cached [`PhaseArtifact`] may be
/// reused without re-running the phase that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Hash arbitrary bytes into a fingerprint (blake3, matching the
    /// content-hashing approach used elsewhere in the broader agent-runtime
    /// stack this crate was adapted from).
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Hash a serializable value into a fingerprint by way of its canonical
    /// JSON encoding.
    ///
    /// Returns `None` if the value cannot be serialized; callers should
    /// treat that as "never reusable" rather than panic.
    #[must_use]
    pub fn of_json<T: Serialize>(value: &T) -> Option<Self> {
        serde_json::to_vec(value).ok().map(|v| Self::of(&v))
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// A cached output of one Brain phase.
///
/// Reusable iff both [`PhaseArtifact::input_fingerprint`] and
/// [`PhaseArtifact::dependency_fingerprint`] still match the current turn's
/// inputs and the current deployment's config/ruleset/scenario/session-state
/// versions (see [`PhaseArtifact::is_reusable`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseArtifact {
    /// The phase number this artifact was produced by.
    pub phase: u32,
    /// The phase's output, opaque to ACF.
    pub data: serde_json::Value,
    /// Fingerprint of the normalized inputs the phase consumed.
    pub input_fingerprint: Fingerprint,
    /// Fingerprint of `{config_version, ruleset_version, scenario_version,
    /// session_state_version}` at the time the phase ran.
    pub dependency_fingerprint: Fingerprint,
    /// When the artifact was produced.
    pub created_at: DateTime<Utc>,
}

impl PhaseArtifact {
    /// Whether this artifact may be reused instead of re-running its phase,
    /// given the current input and dependency fingerprints.
    #[must_use]
    pub fn is_reusable(&self, current_input: Fingerprint, current_dependency: Fingerprint) -> bool {
        self.input_fingerprint == current_input && self.dependency_fingerprint == current_dependency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_of_json_is_deterministic() {
        let a = Fingerprint::of_json(&serde_json::json!({"a": 1, "b": 2})).unwrap();
        let b = Fingerprint::of_json(&serde_json::json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_of_json_differs_on_different_input() {
        let a = Fingerprint::of_json(&serde_json::json!({"a": 1})).unwrap();
        let b = Fingerprint::of_json(&serde_json::json!({"a": 2})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn artifact_reusable_iff_both_fingerprints_match() {
        let input = Fingerprint::of(b"input");
        let dep = Fingerprint::of(b"dep");
        let other = Fingerprint::of(b"other");
        let artifact = PhaseArtifact {
            phase: 1,
            data: serde_json::json!({"ok": true}),
            input_fingerprint: input,
            dependency_fingerprint: dep,
            created_at: Utc::now(),
        };
        assert!(artifact.is_reusable(input, dep));
        assert!(!artifact.is_reusable(other, dep));
        assert!(!artifact.is_reusable(input, other));
    }
}
