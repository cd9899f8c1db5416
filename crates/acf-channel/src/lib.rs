//! ACF Channel — the channel adapter boundary: normalized inbound and
//! outbound envelopes, and the [`ChannelAdapter`] trait wire channels
//! implement. Real protocol translation (WhatsApp Business API, AG-UI,
//! SMS) is out of scope; [`InProcessChannelAdapter`] is test/demo
//! scaffolding only.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod adapter;
pub mod envelope;
pub mod error;

pub mod prelude;

pub use adapter::{ChannelAdapter, InProcessChannelAdapter};
pub use envelope::{IngressResponse, InboundEnvelope, OutboundEnvelope};
pub use error::{ChannelError, ChannelResult};
