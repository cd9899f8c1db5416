//! Channel adapter error types.

use thiserror::Error;

/// Errors that can occur delivering an outbound envelope to a channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The adapter could not reach the wire transport (closed socket,
    /// dropped receiver, provider outage).
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),

    /// The outbound envelope named a channel this adapter does not serve.
    #[error("adapter does not serve channel {channel}")]
    UnsupportedChannel {
        /// The channel name from the envelope.
        channel: String,
    },
}

/// Result type for channel adapter operations.
pub type ChannelResult<T> = Result<T, ChannelError>;
