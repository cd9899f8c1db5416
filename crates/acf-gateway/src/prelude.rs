//! Convenience re-exports for downstream crates.

pub use crate::error::{GatewayError, GatewayResult};
pub use crate::event::{EventRegistry, GatewayEvent};
pub use crate::gateway::{GatewayOutcome, TurnGateway};
pub use crate::overflow::OverflowTracker;
