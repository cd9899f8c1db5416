//! Layered configuration loading: embedded defaults → tenant overrides →
//! per-agent overrides, so every setting is overridable per tenant and per
//! agent without forking the whole config tree.

use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::deep_merge;
use crate::types::AcfConfig;
use crate::validate;

const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Load the embedded defaults, merge each of `overlays` on top in order,
/// deserialize, and validate.
///
/// Each overlay is raw TOML text; later overlays take precedence over
/// earlier ones, and all of them take precedence over the embedded
/// defaults. Typical use: `&[tenant_toml, agent_toml]`.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if `base` or any overlay is not valid
/// TOML, or [`ConfigError::Invalid`] if the merged result fails
/// [`validate::validate`].
pub fn load_str(base: &str, overlays: &[&str]) -> ConfigResult<AcfConfig> {
    let mut merged: toml::Value = toml::from_str(base).map_err(|source| ConfigError::Parse {
        layer: "base".to_string(),
        source,
    })?;

    for (i, overlay_text) in overlays.iter().enumerate() {
        let overlay: toml::Value = toml::from_str(overlay_text).map_err(|source| ConfigError::Parse {
            layer: format!("overlay[{i}]"),
            source,
        })?;
        deep_merge(&mut merged, &overlay);
        debug!(overlay_index = i, "merged config overlay");
    }

    let config = AcfConfig::deserialize(merged).map_err(|source| ConfigError::Parse {
        layer: "merged".to_string(),
        source,
    })?;

    validate::validate(&config)?;
    Ok(config)
}

/// Load the embedded global defaults with no overlays.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the embedded defaults somehow fail
/// validation (a build-time invariant, not expected in practice).
pub fn load_defaults() -> ConfigResult<AcfConfig> {
    load_str(DEFAULTS_TOML, &[])
}

/// Load with an optional tenant overlay and an optional per-agent overlay
/// layered on top of the embedded defaults, per §6's "overridable per
/// tenant and per agent".
///
/// # Errors
///
/// See [`load_str`].
pub fn load_layered(tenant_overlay: Option<&str>, agent_overlay: Option<&str>) -> ConfigResult<AcfConfig> {
    let mut overlays = Vec::new();
    if let Some(tenant) = tenant_overlay {
        overlays.push(tenant);
    }
    if let Some(agent) = agent_overlay {
        overlays.push(agent);
    }
    load_str(DEFAULTS_TOML, &overlays)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_defaults_alone_succeeds() {
        let config = load_defaults().unwrap();
        assert_eq!(config.accumulator.min_wait_ms, 200);
        assert_eq!(config.channels["whatsapp"].default_turn_window_ms, 1200);
    }

    #[test]
    fn tenant_overlay_replaces_a_leaf_without_dropping_siblings() {
        let config = load_layered(Some("[channels.web]\ndefault_turn_window_ms = 900\n"), None).unwrap();
        assert_eq!(config.channels["web"].default_turn_window_ms, 900);
        assert_eq!(config.channels["web"].max_message_length, 8192);
    }

    #[test]
    fn agent_overlay_takes_precedence_over_tenant_overlay() {
        let config = load_layered(
            Some("[channels.web]\ndefault_turn_window_ms = 900\n"),
            Some("[channels.web]\ndefault_turn_window_ms = 1500\n"),
        )
        .unwrap();
        assert_eq!(config.channels["web"].default_turn_window_ms, 1500);
    }

    #[test]
    fn tool_policies_overlay_merges_onto_empty_defaults() {
        let config = load_layered(Some("[tool_policies]\ncharge_card = \"irreversible\"\n"), None).unwrap();
        assert_eq!(
            config.tool_policies.get("charge_card").copied(),
            Some(acf_core::SideEffectPolicy::Irreversible)
        );
    }
}
