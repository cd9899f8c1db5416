//! Convenience re-exports for downstream crates.

pub use crate::error::{ConfigError, ConfigResult};
pub use crate::loader::{load_defaults, load_layered, load_str};
pub use crate::types::{
    AccumulatorConfig, AcfConfig, ChannelConfig, IdempotencyConfig, MutexConfig, OverflowConfig, SessionStoreConfig,
};
