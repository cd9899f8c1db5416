//! ACF Config — the layered environment/configuration surface of §6:
//! channel defaults, tool policy declarations, accumulation clamps, mutex
//! lease TTL, session-store TTLs, per-channel overflow caps, and
//! idempotency TTLs, all overridable per tenant and per agent.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod loader;
pub mod merge;
pub mod types;
pub mod validate;

pub mod prelude;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_defaults, load_layered, load_str};
pub use types::{
    AccumulatorConfig, AcfConfig, ChannelConfig, IdempotencyConfig, MutexConfig, OverflowConfig, SessionStoreConfig,
};
