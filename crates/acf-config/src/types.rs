//! The deserialized shape of a merged configuration tree.

use std::collections::HashMap;

use acf_core::{ChannelModel, MessageBatching, SideEffectPolicy};
use serde::Deserialize;

/// Accumulator clamp bounds (§4.5).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AccumulatorConfig {
    /// The minimum wait window `suggest_wait_ms` may return.
    pub min_wait_ms: u64,
    /// The maximum wait window `suggest_wait_ms` may return.
    pub max_wait_ms: u64,
}

/// Session mutex lease and blocking-acquire defaults (§4.1).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MutexConfig {
    /// How long a lease lives before it may be reclaimed by a new holder.
    pub lease_ttl_secs: u64,
    /// How long `acquire` blocks waiting for an incumbent holder.
    pub blocking_timeout_secs: u64,
}

/// Session store tier TTLs (§4.2).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SessionStoreConfig {
    /// Hot-tier TTL.
    pub hot_ttl_secs: u64,
}

/// Idempotency scope TTLs (§4.4).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IdempotencyConfig {
    /// API-scope TTL.
    pub api_ttl_secs: u64,
    /// Beat-scope TTL.
    pub beat_ttl_secs: u64,
    /// Tool-scope TTL.
    pub tool_ttl_secs: u64,
}

/// One channel's configured model (§3 `ChannelModel`), deserialized
/// directly into the shape `acf-core` consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    /// Base accumulation window in milliseconds.
    pub default_turn_window_ms: u64,
    /// Whether the channel supports a typing indicator.
    pub typing_indicator_available: bool,
    /// Maximum single-message length.
    pub max_message_length: usize,
    /// Whether the channel renders markdown.
    pub supports_markdown: bool,
    /// Whether the channel supports rich media.
    pub supports_rich_media: bool,
}

impl ChannelConfig {
    /// Turn a configured channel into the runtime [`ChannelModel`] the
    /// accumulator and gateway consume.
    #[must_use]
    pub fn into_model(self, channel: impl Into<String>) -> ChannelModel {
        ChannelModel {
            channel: channel.into(),
            default_turn_window_ms: self.default_turn_window_ms,
            typing_indicator_available: self.typing_indicator_available,
            message_batching: MessageBatching::None,
            max_message_length: self.max_message_length,
            supports_markdown: self.supports_markdown,
            supports_rich_media: self.supports_rich_media,
        }
    }
}

/// Per-channel bounded-overflow-queue caps (§4.6): reject with backpressure
/// once more than `max_queued` messages arrive within `window_ms`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OverflowConfig {
    /// Maximum messages admitted to the per-session overflow queue.
    pub max_queued: usize,
    /// The window, in milliseconds, `max_queued` is measured over.
    pub window_ms: u64,
}

/// The full merged configuration tree.
#[derive(Debug, Clone, Deserialize)]
pub struct AcfConfig {
    /// Accumulator clamp bounds.
    pub accumulator: AccumulatorConfig,
    /// Session mutex defaults.
    pub mutex: MutexConfig,
    /// Session store tier TTLs.
    pub session_store: SessionStoreConfig,
    /// Idempotency scope TTLs.
    pub idempotency: IdempotencyConfig,
    /// Per-channel model configuration, keyed by channel name.
    pub channels: HashMap<String, ChannelConfig>,
    /// Per-channel overflow caps, keyed by channel name.
    pub overflow: HashMap<String, OverflowConfig>,
    /// Declared tool side-effect policies, keyed by tool name.
    #[serde(default)]
    pub tool_policies: HashMap<String, SideEffectPolicy>,
}

impl AcfConfig {
    /// Build the [`ChannelModel`] table this config describes.
    #[must_use]
    pub fn channel_models(&self) -> HashMap<String, ChannelModel> {
        self.channels
            .iter()
            .map(|(name, cfg)| (name.clone(), cfg.clone().into_model(name.clone())))
            .collect()
    }
}
