//! Normalized envelopes exchanged across the channel adapter boundary.

use acf_core::{SessionKey, TurnGroupId, TurnId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message as it arrives from a channel adapter, already normalized away
/// from the wire protocol (AG-UI, WhatsApp Business API, SMS, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEnvelope {
    /// Unique id for this individual message.
    pub message_id: String,
    /// Tenant the message belongs to.
    pub tenant_id: String,
    /// Agent the message is addressed to.
    pub agent_id: String,
    /// The human (or other system) on the other end.
    pub interlocutor_id: String,
    /// Channel name, e.g. `"whatsapp"`, `"web"`.
    pub channel: String,
    /// Message body, already decoded from the wire format.
    pub content: String,
    /// When the adapter received the message.
    pub timestamp: DateTime<Utc>,
    /// Client-supplied idempotency key for API-scope dedup, if the adapter's
    /// protocol carries one.
    pub idempotency_key: Option<String>,
}

impl InboundEnvelope {
    /// Build this envelope's session key.
    ///
    /// # Errors
    ///
    /// Returns an error if any component is empty or contains `:`.
    pub fn session_key(&self) -> Result<SessionKey, acf_core::CoreError> {
        SessionKey::new(
            self.tenant_id.clone(),
            self.agent_id.clone(),
            self.interlocutor_id.clone(),
            self.channel.clone(),
        )
    }
}

/// The Gateway's synchronous reply to an inbound message, before any
/// asynchronous outbound response is produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IngressResponse {
    /// The message was admitted and is driving a (possibly new) turn.
    Accepted {
        /// The turn now coalescing this message.
        turn_id: TurnId,
        /// The Gateway's current estimate of the accumulation wait.
        estimated_wait_ms: u64,
    },
    /// The message matched an existing idempotency record; the cached
    /// envelope is returned instead of starting new work.
    Deduplicated {
        /// The previously produced response envelope.
        cached_envelope: Box<OutboundEnvelope>,
    },
    /// The in-flight turn is past its irreversibility barrier; the message
    /// was parked on the per-session overflow queue.
    Queued {
        /// Position in the overflow queue, for the adapter's deferred-ack
        /// message.
        deferred: usize,
    },
    /// The message was rejected outright (overflow-queue backpressure,
    /// validation failure).
    Rejected {
        /// Why the message was rejected.
        reason: String,
    },
}

/// The response handed from the workflow to the channel adapter, which
/// translates it to the wire protocol. ACF does not speak AG-UI, WhatsApp,
/// or SMS directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    /// The session this response belongs to.
    pub session_key: SessionKey,
    /// The turn that produced this response.
    pub turn_id: TurnId,
    /// The turn's supersede/absorb group.
    pub turn_group_id: TurnGroupId,
    /// Response content, already split into adapter-appropriate segments
    /// (e.g. one bubble per segment on a chat channel).
    pub response_segments: Vec<String>,
    /// Side-channel events the adapter may want to surface (typing
    /// indicators stopping, a scenario transition notice, etc.).
    pub emitted_events: Vec<String>,
}
