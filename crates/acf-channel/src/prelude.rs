//! Convenience re-exports for downstream crates.

pub use crate::adapter::{ChannelAdapter, InProcessChannelAdapter};
pub use crate::envelope::{IngressResponse, InboundEnvelope, OutboundEnvelope};
pub use crate::error::{ChannelError, ChannelResult};
