//! Post-merge validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::AcfConfig;

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the accumulator clamp range is
/// inverted (`min_wait_ms > max_wait_ms`), if any overflow cap has a zero
/// `max_queued` or `window_ms`, or if a tool policy table entry could not
/// be parsed into a known [`acf_core::SideEffectPolicy`] (caught already by
/// deserialization, but re-asserted here so a future looser deserializer
/// cannot silently regress this guarantee).
pub fn validate(config: &AcfConfig) -> ConfigResult<()> {
    if config.accumulator.min_wait_ms > config.accumulator.max_wait_ms {
        return Err(ConfigError::Invalid(format!(
            "accumulator.min_wait_ms ({}) > accumulator.max_wait_ms ({})",
            config.accumulator.min_wait_ms, config.accumulator.max_wait_ms
        )));
    }

    for (channel, overflow) in &config.overflow {
        if overflow.max_queued == 0 {
            return Err(ConfigError::Invalid(format!("overflow.{channel}.max_queued must be > 0")));
        }
        if overflow.window_ms == 0 {
            return Err(ConfigError::Invalid(format!("overflow.{channel}.window_ms must be > 0")));
        }
    }

    if config.mutex.lease_ttl_secs == 0 {
        return Err(ConfigError::Invalid("mutex.lease_ttl_secs must be > 0".to_string()));
    }

    Ok(())
}
