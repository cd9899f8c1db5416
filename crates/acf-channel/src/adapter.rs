//! The channel adapter boundary: translates normalized outbound envelopes
//! to whatever wire protocol a specific channel speaks.
//!
//! ACF ships no real protocol translation (WhatsApp Business API, AG-UI,
//! SMS); that is explicitly out of scope. [`InProcessChannelAdapter`] exists
//! only so the workspace builds end to end and integration tests have
//! something to assert against.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::envelope::OutboundEnvelope;
use crate::error::{ChannelError, ChannelResult};

/// A sink for outbound responses, implemented once per wire channel.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// The channel name this adapter serves (e.g. `"whatsapp"`, `"web"`).
    fn channel_name(&self) -> &str;

    /// Deliver an outbound envelope to the underlying transport.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::DeliveryFailed`] if the transport rejects or
    /// cannot be reached, or [`ChannelError::UnsupportedChannel`] if the
    /// envelope's session channel does not match [`ChannelAdapter::channel_name`].
    async fn deliver(&self, envelope: OutboundEnvelope) -> ChannelResult<()>;
}

/// An in-process adapter that hands every delivered envelope to an mpsc
/// channel instead of a wire transport. Used by the demo binary and by
/// integration tests that need to observe committed responses.
pub struct InProcessChannelAdapter {
    channel_name: String,
    sender: mpsc::UnboundedSender<OutboundEnvelope>,
}

impl InProcessChannelAdapter {
    /// Build an adapter for `channel_name`, returning it paired with the
    /// receiving half so a test can drain delivered envelopes.
    #[must_use]
    pub fn new(channel_name: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<OutboundEnvelope>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                channel_name: channel_name.into(),
                sender,
            },
            receiver,
        )
    }
}

#[async_trait]
impl ChannelAdapter for InProcessChannelAdapter {
    fn channel_name(&self) -> &str {
        &self.channel_name
    }

    async fn deliver(&self, envelope: OutboundEnvelope) -> ChannelResult<()> {
        debug!(
            channel = %self.channel_name,
            turn_id = %envelope.turn_id,
            segment_count = envelope.response_segments.len(),
            "delivering outbound envelope"
        );
        self.sender
            .send(envelope)
            .map_err(|e| ChannelError::DeliveryFailed(e.to_string()))
    }
}
