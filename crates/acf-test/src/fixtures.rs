//! Test fixtures for common ACF types.

use acf_core::{LogicalTurn, SessionKey};
use chrono::Utc;
use uuid::Uuid;

/// Build a session key from default tenant/agent/interlocutor/channel
/// components, suffixed with a fresh UUID so concurrent tests never
/// collide on the same key.
#[must_use]
pub fn test_session_key() -> SessionKey {
    let suffix = Uuid::new_v4();
    SessionKey::new("test-tenant", "test-agent", format!("user-{suffix}"), "web")
        .expect("fixture components never contain ':' or empty strings")
}

/// Build a session key for a specific channel, otherwise using fixture
/// defaults.
#[must_use]
pub fn test_session_key_for_channel(channel: impl Into<String>) -> SessionKey {
    let suffix = Uuid::new_v4();
    SessionKey::new("test-tenant", "test-agent", format!("user-{suffix}"), channel)
        .expect("fixture components never contain ':' or empty strings")
}

/// Start a fresh [`LogicalTurn`] for `session_key`, carrying a single
/// generated message id, anchored at the current wall-clock time.
#[must_use]
pub fn test_turn(session_key: SessionKey) -> LogicalTurn {
    let message_id = format!("msg-{}", Uuid::new_v4());
    LogicalTurn::start(session_key, message_id, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_keys_are_unique_across_calls() {
        assert_ne!(test_session_key(), test_session_key());
    }

    #[test]
    fn test_turn_starts_active_and_accumulating() {
        let turn = test_turn(test_session_key());
        assert!(turn.can_absorb_message());
    }
}
