//! Gateway error taxonomy.

/// Errors produced while routing an inbound message.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A store backing the gateway failed.
    #[error(transparent)]
    Storage(#[from] acf_storage::StorageError),

    /// The caller-supplied envelope fields did not form a valid session key.
    #[error(transparent)]
    InvalidSessionKey(#[from] acf_core::CoreError),

    /// The message's channel has no configured [`acf_core::ChannelModel`].
    #[error("no channel model configured for channel {0:?}")]
    UnknownChannel(String),

    /// The per-session overflow FIFO is at capacity for its configured
    /// `(max_queued, window_ms)`.
    #[error("overflow queue full for session {0}")]
    OverflowRejected(String),
}

/// Result alias used throughout `acf-gateway`.
pub type GatewayResult<T> = Result<T, GatewayError>;
