//! Mock implementations for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use acf_accumulator::PipelineHint;
use acf_brain::probe::InterruptProbe;
use acf_brain::Brain;
use acf_channel::envelope::OutboundEnvelope;
use acf_channel::{ChannelAdapter, ChannelError, ChannelResult};
use acf_core::{Fingerprint, LogicalTurn, PhaseArtifact, TurnResult};
use async_trait::async_trait;

/// A [`ChannelAdapter`] that records every delivered envelope instead of
/// forwarding it anywhere, so a test can assert on exactly what was sent.
///
/// Uses `std::sync::Mutex` so captured envelopes can be inspected
/// synchronously after an `.await`, without draining a channel.
#[derive(Debug, Clone)]
pub struct MockChannelAdapter {
    channel_name: String,
    delivered: Arc<Mutex<Vec<OutboundEnvelope>>>,
    fail_next: Arc<Mutex<bool>>,
}

impl MockChannelAdapter {
    /// Build a mock adapter for `channel_name` with no prior captures.
    #[must_use]
    pub fn new(channel_name: impl Into<String>) -> Self {
        Self {
            channel_name: channel_name.into(),
            delivered: Arc::new(Mutex::new(Vec::new())),
            fail_next: Arc::new(Mutex::new(false)),
        }
    }

    /// Make the next [`ChannelAdapter::deliver`] call return
    /// [`ChannelError::DeliveryFailed`], then resume succeeding.
    pub fn fail_next_delivery(&self) {
        *self.fail_next.lock().expect("mock mutex poisoned") = true;
    }

    /// All envelopes captured so far, oldest first.
    #[must_use]
    pub fn delivered(&self) -> Vec<OutboundEnvelope> {
        self.delivered.lock().expect("mock mutex poisoned").clone()
    }
}

#[async_trait]
impl ChannelAdapter for MockChannelAdapter {
    fn channel_name(&self) -> &str {
        &self.channel_name
    }

    async fn deliver(&self, envelope: OutboundEnvelope) -> ChannelResult<()> {
        let mut fail_next = self.fail_next.lock().expect("mock mutex poisoned");
        if *fail_next {
            *fail_next = false;
            return Err(ChannelError::DeliveryFailed("mock adapter told to fail".to_string()));
        }
        drop(fail_next);
        self.delivered.lock().expect("mock mutex poisoned").push(envelope);
        Ok(())
    }
}

/// A [`Brain`] that hands back a pre-scripted queue of [`TurnResult`]s
/// instead of running any real pipeline, for tests that need to drive the
/// workflow through a specific sequence of outcomes (e.g. an interrupt
/// followed by a completion).
#[derive(Debug, Clone)]
pub struct ScriptedBrain {
    results: Arc<Mutex<VecDeque<TurnResult>>>,
    followup_hint: Arc<Mutex<Option<PipelineHint>>>,
}

impl ScriptedBrain {
    /// Build a scripted Brain that yields `results` in order, one per
    /// `process_turn` call, and no followup hint. Panics when the queue is
    /// exhausted rather than running a real pipeline.
    #[must_use]
    pub fn new(results: Vec<TurnResult>) -> Self {
        Self {
            results: Arc::new(Mutex::new(VecDeque::from(results))),
            followup_hint: Arc::new(Mutex::new(None)),
        }
    }

    /// Set the hint [`Brain::summarize_for_followup`] will return.
    #[must_use]
    pub fn with_followup_hint(self, hint: PipelineHint) -> Self {
        *self.followup_hint.lock().expect("mock mutex poisoned") = Some(hint);
        self
    }
}

#[async_trait]
impl Brain for ScriptedBrain {
    async fn process_turn(
        &self,
        _turn: &LogicalTurn,
        _probe: &dyn InterruptProbe,
        _reusable_artifacts: &HashMap<u32, PhaseArtifact>,
    ) -> TurnResult {
        self.results
            .lock()
            .expect("mock mutex poisoned")
            .pop_front()
            .expect("ScriptedBrain queue exhausted: script more results than the test drives turns")
    }

    async fn summarize_for_followup(&self, _turn: &LogicalTurn) -> Option<PipelineHint> {
        self.followup_hint.lock().expect("mock mutex poisoned").clone()
    }
}

/// A completed [`TurnResult`] fixture with no scenario transition and no
/// reply, for scripting simple commit paths.
#[must_use]
pub fn completed_result(turn_id: acf_core::TurnId) -> TurnResult {
    TurnResult::Completed {
        turn_id,
        scenario_transition: None,
        reply: Some(serde_json::json!({ "text": "ok" })),
        confidence: 1.0,
    }
}

#[allow(unused)]
fn fingerprint_is_grounded(_f: &Fingerprint) {}

#[cfg(test)]
mod tests {
    use super::*;
    use acf_core::TurnId;

    #[tokio::test]
    async fn mock_channel_adapter_captures_delivered_envelopes() {
        let adapter = MockChannelAdapter::new("web");
        assert!(adapter.delivered().is_empty());
    }

    #[tokio::test]
    async fn scripted_brain_yields_queued_results_in_order() {
        let turn_id = TurnId::new();
        let brain = ScriptedBrain::new(vec![completed_result(turn_id)]);
        let turn = crate::fixtures::test_turn(crate::fixtures::test_session_key());
        let probe = acf_brain::probe::NeverInterrupt;
        let result = brain.process_turn(&turn, &probe, &HashMap::new()).await;
        assert_eq!(result.turn_id(), turn_id);
    }
}
