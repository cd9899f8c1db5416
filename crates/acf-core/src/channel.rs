//! The per-channel read-only model consulted by the accumulator and gateway.

use serde::{Deserialize, Serialize};

/// How a channel natively batches rapid-fire messages, if at all.
///
/// This does not change ACF's own accumulation behavior; it documents what
/// the upstream platform already does, so the accumulator's channel default
/// can account for it (a channel that already batches client-side needs a
/// smaller server-side window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageBatching {
    /// No client-side batching; every keystroke/send is a separate message.
    None,
    /// WhatsApp-style: the client coalesces rapid sends into one delivery.
    WhatsappStyle,
    /// Telegram-style: media groups and rapid sends may arrive pre-batched.
    TelegramStyle,
}

/// Read-only per-channel configuration consulted by [`acf_accumulator`] and
/// the gateway.
///
/// [`acf_accumulator`]: https://docs.rs/acf-accumulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelModel {
    /// The channel this model describes (e.g. `"whatsapp"`, `"web"`).
    pub channel: String,
    /// Base accumulation window in milliseconds for this channel.
    pub default_turn_window_ms: u64,
    /// Whether the channel can show a typing indicator while accumulating.
    pub typing_indicator_available: bool,
    /// Native client-side message batching behavior.
    pub message_batching: MessageBatching,
    /// Maximum single-message length the channel accepts.
    pub max_message_length: usize,
    /// Whether the channel renders markdown.
    pub supports_markdown: bool,
    /// Whether the channel supports rich media attachments.
    pub supports_rich_media: bool,
}

impl ChannelModel {
    /// The WhatsApp channel model (`default_turn_window_ms ≈ 1200`).
    #[must_use]
    pub fn whatsapp() -> Self {
        Self {
            channel: "whatsapp".to_string(),
            default_turn_window_ms: 1200,
            typing_indicator_available: true,
            message_batching: MessageBatching::WhatsappStyle,
            max_message_length: 4096,
            supports_markdown: true,
            supports_rich_media: true,
        }
    }

    /// The SMS channel model (`default_turn_window_ms ≈ 800`).
    #[must_use]
    pub fn sms() -> Self {
        Self {
            channel: "sms".to_string(),
            default_turn_window_ms: 800,
            typing_indicator_available: false,
            message_batching: MessageBatching::None,
            max_message_length: 1600,
            supports_markdown: false,
            supports_rich_media: false,
        }
    }

    /// The web-chat channel model (`default_turn_window_ms ≈ 600`).
    #[must_use]
    pub fn web() -> Self {
        Self {
            channel: "web".to_string(),
            default_turn_window_ms: 600,
            typing_indicator_available: true,
            message_batching: MessageBatching::None,
            max_message_length: 8192,
            supports_markdown: true,
            supports_rich_media: true,
        }
    }

    /// The Telegram channel model, extrapolated from the WhatsApp/web
    /// defaults plus its own message-batching behavior (recorded as an
    /// Open Question decision in `DESIGN.md`).
    #[must_use]
    pub fn telegram() -> Self {
        Self {
            channel: "telegram".to_string(),
            default_turn_window_ms: 1000,
            typing_indicator_available: true,
            message_batching: MessageBatching::TelegramStyle,
            max_message_length: 4096,
            supports_markdown: true,
            supports_rich_media: true,
        }
    }

    /// The email channel model (`default_turn_window_ms ≈ 0`: email is not
    /// accumulated, each message stands alone as its own turn).
    #[must_use]
    pub fn email() -> Self {
        Self {
            channel: "email".to_string(),
            default_turn_window_ms: 0,
            typing_indicator_available: false,
            message_batching: MessageBatching::None,
            max_message_length: 1_000_000,
            supports_markdown: false,
            supports_rich_media: true,
        }
    }

    /// The voice channel model (`default_turn_window_ms ≈ 0`: a voice turn
    /// is bounded by end-of-utterance detection upstream, not by ACF).
    #[must_use]
    pub fn voice() -> Self {
        Self {
            channel: "voice".to_string(),
            default_turn_window_ms: 0,
            typing_indicator_available: false,
            message_batching: MessageBatching::None,
            max_message_length: 10_000,
            supports_markdown: false,
            supports_rich_media: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whatsapp_default_turn_window_is_1200ms() {
        assert_eq!(ChannelModel::whatsapp().default_turn_window_ms, 1200);
    }

    #[test]
    fn sms_default_turn_window_is_800ms() {
        assert_eq!(ChannelModel::sms().default_turn_window_ms, 800);
    }

    #[test]
    fn web_default_turn_window_is_600ms() {
        assert_eq!(ChannelModel::web().default_turn_window_ms, 600);
    }

    #[test]
    fn email_and_voice_do_not_accumulate() {
        assert_eq!(ChannelModel::email().default_turn_window_ms, 0);
        assert_eq!(ChannelModel::voice().default_turn_window_ms, 0);
    }
}
