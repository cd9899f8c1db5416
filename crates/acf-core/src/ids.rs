//! Identifiers used throughout ACF: the session key, fencing tokens, and the
//! turn/turn-group identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// The composite key `tenant:agent:interlocutor:channel`.
///
/// This is the unit of single-writer discipline: the session mutex, the
/// session store, the turn store, and every index are all keyed on this
/// value. Treat it as opaque outside of display/parse; never split it back
/// into its parts with naive `split(':')` (a field may itself be empty but
/// never contains `:`, which [`SessionKey::new`] enforces).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    tenant_id: String,
    agent_id: String,
    interlocutor_id: String,
    channel: String,
}

impl SessionKey {
    /// Build a session key from its four components.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSessionKey`] if any component contains a
    /// `:` (which would make the canonical string representation ambiguous
    /// to parse) or is empty.
    pub fn new(
        tenant_id: impl Into<String>,
        agent_id: impl Into<String>,
        interlocutor_id: impl Into<String>,
        channel: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let (tenant_id, agent_id, interlocutor_id, channel) = (
            tenant_id.into(),
            agent_id.into(),
            interlocutor_id.into(),
            channel.into(),
        );
        for (name, value) in [
            ("tenant_id", &tenant_id),
            ("agent_id", &agent_id),
            ("interlocutor_id", &interlocutor_id),
            ("channel", &channel),
        ] {
            if value.is_empty() {
                return Err(CoreError::InvalidSessionKey {
                    key: format!("{tenant_id}:{agent_id}:{interlocutor_id}:{channel}"),
                    reason: format!("{name} must not be empty"),
                });
            }
            if value.contains(':') {
                return Err(CoreError::InvalidSessionKey {
                    key: format!("{tenant_id}:{agent_id}:{interlocutor_id}:{channel}"),
                    reason: format!("{name} must not contain ':'"),
                });
            }
        }
        Ok(Self {
            tenant_id,
            agent_id,
            interlocutor_id,
            channel,
        })
    }

    /// The tenant component.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// The agent component.
    #[must_use]
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// The interlocutor component.
    #[must_use]
    pub fn interlocutor_id(&self) -> &str {
        &self.interlocutor_id
    }

    /// The channel component.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The canonical storage key string, used by every store and index.
    #[must_use]
    pub fn as_canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.tenant_id, self.agent_id, self.interlocutor_id, self.channel
        )
    }
}

impl FromStr for SessionKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [tenant_id, agent_id, interlocutor_id, channel] = parts.as_slice() else {
            return Err(CoreError::InvalidSessionKey {
                key: s.to_string(),
                reason: "expected exactly 4 ':'-separated components".to_string(),
            });
        };
        Self::new(*tenant_id, *agent_id, *interlocutor_id, *channel)
    }
}

/// A monotonically increasing identifier accompanying every write to a
/// session-keyed resource.
///
/// Stores reject writes whose token is not strictly greater than the last
/// token they observed for that key, which is what prevents a stale lock
/// holder from winning a commit race after its lease has expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FencingToken(u64);

impl FencingToken {
    /// The token that compares less than every token a real issuer produces.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Wrap a raw value. Only issuers (the session mutex) should call this;
    /// everyone else should treat tokens as opaque and compare them with
    /// `Ord`.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// The raw value, for storage encoding.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FencingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A process-local, strictly monotonic issuer of [`FencingToken`]s.
///
/// A single mutex implementation owns one of these per deployment (backed by
/// a persistent counter in a real deployment; an in-process atomic is
/// sufficient for the reference lock and for tests).
#[derive(Debug, Default)]
pub struct FencingTokenIssuer {
    next: AtomicU64,
}

impl FencingTokenIssuer {
    /// Create an issuer starting at token 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Issue the next token. Strictly greater than every previously issued
    /// token.
    pub fn issue(&self) -> FencingToken {
        FencingToken(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

/// Identifier of a single [`crate::LogicalTurn`] (one "beat").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(pub Uuid);

impl TurnId {
    /// Generate a new random turn ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier shared by every turn in a supersede/absorb chain.
///
/// Stable across supersede: when a turn is superseded, the replacement turn
/// inherits the same `TurnGroupId`. At most one turn in a group may reach
/// `COMPLETE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnGroupId(pub Uuid);

impl TurnGroupId {
    /// Start a new turn group (used when a turn has no predecessor to
    /// inherit from).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnGroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_round_trips_through_display_and_parse() {
        let key = SessionKey::new("acme", "support-bot", "user-42", "whatsapp").unwrap();
        let s = key.to_string();
        assert_eq!(s, "acme:support-bot:user-42:whatsapp");
        let parsed: SessionKey = s.parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn session_key_rejects_colon_in_component() {
        let err = SessionKey::new("acme", "bot:evil", "user", "web").unwrap_err();
        assert!(matches!(err, CoreError::InvalidSessionKey { .. }));
    }

    #[test]
    fn session_key_rejects_empty_component() {
        assert!(SessionKey::new("", "bot", "user", "web").is_err());
    }

    #[test]
    fn session_key_rejects_wrong_arity_on_parse() {
        assert!("acme:bot:user".parse::<SessionKey>().is_err());
        assert!("acme:bot:user:web:extra".parse::<SessionKey>().is_err());
    }

    #[test]
    fn fencing_tokens_strictly_increase() {
        let issuer = FencingTokenIssuer::new();
        let t1 = issuer.issue();
        let t2 = issuer.issue();
        let t3 = issuer.issue();
        assert!(t1 < t2);
        assert!(t2 < t3);
    }

    #[test]
    fn turn_group_id_is_stable_across_clones() {
        let group = TurnGroupId::new();
        let copy = group;
        assert_eq!(group, copy);
    }
}
