//! ACF Accumulator (C5) — the pure, deterministic wait-window suggestion
//! function consulted by the Gateway and the workflow's accumulation step
//! (§4.5).

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

use acf_core::ChannelModel;
use serde::{Deserialize, Serialize};

/// A hint the Brain may emit on commit of the *previous* turn, carried
/// forward into the next turn's accumulation.
///
/// Per §4.5 item 4: when present, this overrides the message-shape nudge
/// (item 2) but the final result remains subject to the `[min_wait,
/// max_wait]` clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineHint {
    /// The Brain's suggested wait, in milliseconds, before the next turn
    /// should be considered complete.
    pub suggested_wait_ms: u64,
    /// The Brain's confidence that this turn was actually complete, in
    /// `[0, 1]`.
    pub completion_confidence: f32,
}

/// The inputs `suggest_wait_ms` is a pure function of.
#[derive(Debug, Clone, Copy)]
pub struct AccumulatorInput<'a> {
    /// The arriving message's text content.
    pub message_content: &'a str,
    /// The channel's read-only model.
    pub channel: &'a ChannelModel,
    /// The p95 inter-message latency observed for this session/interlocutor,
    /// if known.
    pub user_cadence_p95_ms: Option<u64>,
    /// A hint carried forward from the previous turn's commit, if any.
    pub pipeline_hint: Option<PipelineHint>,
}

/// The additive bonus applied when a message looks like a bare greeting.
const GREETING_BONUS_MS: u64 = 500;

/// The additive bonus applied when a message looks like a trailing
/// fragment (likely to be followed by more text).
const FRAGMENT_BONUS_MS: u64 = 300;

const GREETINGS: &[&str] = &["hi", "hello", "hey", "hola", "yo", "howdy", "sup", "hiya"];

fn is_greeting_only(content: &str) -> bool {
    let normalized = content.trim().trim_end_matches(['!', '.', '?']).to_lowercase();
    GREETINGS.contains(&normalized.as_str())
}

fn looks_like_fragment(content: &str) -> bool {
    let trimmed = content.trim_end();
    if trimmed.ends_with(',') || trimmed.ends_with("...") || trimmed.ends_with('…') {
        return true;
    }
    trimmed.split_whitespace().count() < 3
}

/// Suggest the accumulation wait-window extension, in milliseconds, for a
/// newly arrived (or about-to-arrive) message.
///
/// Pure and deterministic given its inputs; never blocks, never touches a
/// clock or store. The caller (the Gateway or the workflow's accumulate
/// step) is responsible for turning this into an absolute deadline against
/// its own [`acf_core::Clock`].
#[must_use]
pub fn suggest_wait_ms(input: &AccumulatorInput<'_>, min_wait_ms: u64, max_wait_ms: u64) -> u64 {
    let base = input.channel.default_turn_window_ms;

    let shape_nudge = match input.pipeline_hint {
        Some(hint) => hint.suggested_wait_ms,
        None => {
            if is_greeting_only(input.message_content) {
                GREETING_BONUS_MS
            } else if looks_like_fragment(input.message_content) {
                FRAGMENT_BONUS_MS
            } else {
                0
            }
        }
    };

    let combined = base.saturating_add(shape_nudge);

    let with_cadence = match input.user_cadence_p95_ms {
        Some(cadence) => combined.saturating_add(cadence) / 2,
        None => combined,
    };

    with_cadence.clamp(min_wait_ms, max_wait_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(content: &'a str, channel: &'a ChannelModel) -> AccumulatorInput<'a> {
        AccumulatorInput {
            message_content: content,
            channel,
            user_cadence_p95_ms: None,
            pipeline_hint: None,
        }
    }

    #[test]
    fn is_pure_and_deterministic() {
        let channel = ChannelModel::web();
        let a = suggest_wait_ms(&input("Hello there, how are you doing today?", &channel), 200, 5000);
        let b = suggest_wait_ms(&input("Hello there, how are you doing today?", &channel), 200, 5000);
        assert_eq!(a, b);
    }

    #[test]
    fn greeting_only_gets_a_bonus() {
        let channel = ChannelModel::web();
        let greeting = suggest_wait_ms(&input("hi", &channel), 0, 10_000);
        let sentence = suggest_wait_ms(&input("Can you help me track my order please", &channel), 0, 10_000);
        assert_eq!(greeting, channel.default_turn_window_ms + GREETING_BONUS_MS);
        assert_eq!(sentence, channel.default_turn_window_ms);
    }

    #[test]
    fn trailing_fragment_gets_a_smaller_bonus() {
        let channel = ChannelModel::web();
        let fragment = suggest_wait_ms(&input("well,", &channel), 0, 10_000);
        assert_eq!(fragment, channel.default_turn_window_ms + FRAGMENT_BONUS_MS);
    }

    #[test]
    fn pipeline_hint_overrides_shape_nudge() {
        let channel = ChannelModel::web();
        let mut i = input("hi", &channel);
        i.pipeline_hint = Some(PipelineHint {
            suggested_wait_ms: 50,
            completion_confidence: 0.8,
        });
        let result = suggest_wait_ms(&i, 0, 10_000);
        assert_eq!(result, channel.default_turn_window_ms + 50);
    }

    #[test]
    fn result_is_clamped() {
        let channel = ChannelModel::whatsapp();
        let result = suggest_wait_ms(&input("hi", &channel), 100, 900);
        assert_eq!(result, 900);
        let result = suggest_wait_ms(&input("a test sentence here", &channel), 2000, 5000);
        assert_eq!(result, 2000);
    }

    #[test]
    fn cadence_is_averaged_with_base() {
        let channel = ChannelModel::web();
        let mut i = input("a full sentence with enough words", &channel);
        i.user_cadence_p95_ms = Some(2000);
        let result = suggest_wait_ms(&i, 0, 10_000);
        assert_eq!(result, (channel.default_turn_window_ms + 2000) / 2);
    }
}
