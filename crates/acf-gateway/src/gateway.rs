//! [`TurnGateway`]: the single entry point for an inbound message (§4.6).
//!
//! The Gateway classifies every inbound message into `{new, absorb,
//! supersede, queue}` and never itself holds the session mutex — it only
//! reads turn metadata and writes through the turn store's conditional-write
//! guarantees, then hands the classification to the workflow supervisor as a
//! [`TurnDecision`] alongside the synchronous [`IngressResponse`] the channel
//! adapter should return upstream.

use std::collections::HashMap;
use std::sync::Arc;

use acf_accumulator::{suggest_wait_ms, AccumulatorInput};
use acf_brain::policy::{PolicyInputs, PolicyTable};
use acf_channel::{InboundEnvelope, IngressResponse, OutboundEnvelope};
use acf_config::{AcfConfig, OverflowConfig};
use acf_core::{
    AccumulationDecision, ChannelModel, Clock, FencingToken, LogicalTurn, SessionKey, SideEffectPolicy,
    SupersedeAction, SupersedeDecision, TurnDecision,
};
use acf_storage::idempotency::{scoped_key, IdempotencyScope, IdempotencyStore};
use acf_storage::turn::{SharedTurnStore, TurnStore};
use tracing::{debug, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::event::{EventRegistry, GatewayEvent};
use crate::overflow::OverflowTracker;

/// The classification plus the caller-facing reply produced by
/// [`TurnGateway::ingest`].
#[derive(Debug, Clone)]
pub struct GatewayOutcome {
    /// What the workflow supervisor should do (start a workflow, rely on an
    /// already-running one to observe the emitted event, or nothing further
    /// — the message was queued or rejected).
    pub decision: TurnDecision,
    /// What the channel adapter should send back synchronously.
    pub response: IngressResponse,
}

/// Single entry point for inbound messages (C6).
pub struct TurnGateway {
    turn_store: SharedTurnStore,
    api_idempotency: Arc<dyn IdempotencyStore>,
    channel_models: HashMap<String, ChannelModel>,
    overflow_configs: HashMap<String, OverflowConfig>,
    accumulator_bounds: (u64, u64),
    policy: PolicyTable,
    events: EventRegistry,
    overflow: OverflowTracker,
    clock: Arc<dyn Clock>,
}

impl TurnGateway {
    /// Build a Gateway from a merged configuration tree and its store
    /// dependencies.
    #[must_use]
    pub fn new(
        config: &AcfConfig,
        turn_store: SharedTurnStore,
        api_idempotency: Arc<dyn IdempotencyStore>,
        policy: PolicyTable,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            turn_store,
            api_idempotency,
            channel_models: config.channel_models(),
            overflow_configs: config.overflow.clone(),
            accumulator_bounds: (config.accumulator.min_wait_ms, config.accumulator.max_wait_ms),
            policy,
            events: EventRegistry::new(),
            overflow: OverflowTracker::new(),
            clock,
        }
    }

    /// The event registry workflow instances register against on
    /// `acquire_mutex` and deregister from on release.
    #[must_use]
    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    /// Drain every envelope parked behind a now-terminal turn for
    /// `canonical_session_key`, oldest first. Called by the workflow
    /// supervisor after a turn reaches COMPLETE or SUPERSEDED, so a QUEUE
    /// decision's backlog becomes the first message(s) of a fresh turn.
    #[must_use]
    pub fn drain_queued(&self, canonical_session_key: &str) -> Vec<InboundEnvelope> {
        self.overflow.drain_parked(canonical_session_key)
    }

    fn channel_model(&self, channel: &str) -> GatewayResult<&ChannelModel> {
        self.channel_models.get(channel).ok_or_else(|| GatewayError::UnknownChannel(channel.to_string()))
    }

    fn overflow_config(&self, channel: &str) -> OverflowConfig {
        self.overflow_configs.get(channel).copied().unwrap_or(OverflowConfig {
            max_queued: 20,
            window_ms: 60_000,
        })
    }

    /// Route one inbound message (§4.6 steps 1-4).
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope's identity fields do not form a
    /// valid [`SessionKey`], its channel has no configured
    /// [`ChannelModel`], or a store call fails.
    pub async fn ingest(&self, envelope: InboundEnvelope) -> GatewayResult<GatewayOutcome> {
        let session_key = envelope.session_key()?;
        let canonical = session_key.as_canonical();
        let now = self.clock.now();

        if let Some(dedup) = self.check_api_idempotency(&session_key, &envelope).await? {
            return Ok(GatewayOutcome {
                decision: TurnDecision::StartNew,
                response: IngressResponse::Deduplicated {
                    cached_envelope: Box::new(dedup),
                },
            });
        }

        let channel_model = self.channel_model(&envelope.channel)?.clone();
        let active = self.turn_store.get_active_turn(&session_key).await?;

        match active {
            None => self.start_new_turn(session_key, envelope, &channel_model, now).await,
            Some(turn) if turn.status == acf_core::TurnStatus::Accumulating => {
                self.absorb_into_accumulating(&canonical, envelope, now).await
            },
            Some(turn) => self.decide_against_processing(turn, envelope, now).await,
        }
    }

    async fn check_api_idempotency(
        &self,
        session_key: &SessionKey,
        envelope: &InboundEnvelope,
    ) -> GatewayResult<Option<OutboundEnvelope>> {
        let Some(idempotency_key) = &envelope.idempotency_key else {
            return Ok(None);
        };
        let key = scoped_key(IdempotencyScope::Api, session_key.tenant_id(), idempotency_key);
        let Some(cached) = self.api_idempotency.peek(&key).await? else {
            return Ok(None);
        };
        match serde_json::from_value::<OutboundEnvelope>(cached) {
            Ok(envelope) => Ok(Some(envelope)),
            Err(e) => {
                warn!(%e, key, "cached API-idempotency value did not deserialize as an OutboundEnvelope");
                Ok(None)
            },
        }
    }

    async fn start_new_turn(
        &self,
        session_key: SessionKey,
        envelope: InboundEnvelope,
        channel_model: &ChannelModel,
        now: chrono::DateTime<chrono::Utc>,
    ) -> GatewayResult<GatewayOutcome> {
        let turn = LogicalTurn::start(session_key, envelope.message_id.clone(), now);
        let turn_id = turn.id;

        let wait_ms = suggest_wait_ms(
            &AccumulatorInput {
                message_content: &envelope.content,
                channel: channel_model,
                user_cadence_p95_ms: None,
                pipeline_hint: None,
            },
            self.accumulator_bounds.0,
            self.accumulator_bounds.1,
        );

        self.turn_store.save(turn, FencingToken::zero()).await?;
        debug!(%turn_id, channel = %envelope.channel, wait_ms, "gateway started a new turn");

        Ok(GatewayOutcome {
            decision: TurnDecision::StartNew,
            response: IngressResponse::Accepted {
                turn_id,
                estimated_wait_ms: wait_ms,
            },
        })
    }

    async fn absorb_into_accumulating(
        &self,
        canonical_session_key: &str,
        envelope: InboundEnvelope,
        now: chrono::DateTime<chrono::Utc>,
    ) -> GatewayResult<GatewayOutcome> {
        let delivered = self.events.emit(
            canonical_session_key,
            GatewayEvent::NewMessage {
                message_id: envelope.message_id.clone(),
                content: envelope.content.clone(),
                received_at: now,
            },
        );

        if !delivered {
            // The registered workflow instance has gone away (e.g. it just
            // committed and deregistered) without the turn store yet
            // reflecting that the turn is terminal. Treat this exactly like
            // "no active turn": let the next `ingest` call (or this one,
            // after a retry) start fresh.
            warn!(session_key = canonical_session_key, "accumulating turn has no registered workflow; message not delivered");
        }

        Ok(GatewayOutcome {
            decision: TurnDecision::Accumulation(AccumulationDecision::Absorb),
            response: IngressResponse::Accepted {
                turn_id: acf_core::TurnId::new(),
                estimated_wait_ms: 0,
            },
        })
    }

    async fn decide_against_processing(
        &self,
        turn: LogicalTurn,
        envelope: InboundEnvelope,
        now: chrono::DateTime<chrono::Utc>,
    ) -> GatewayResult<GatewayOutcome> {
        let canonical = turn.session_key.as_canonical();

        if !turn.can_absorb_message() {
            return self.queue_behind(&canonical, &turn, envelope, now, "turn holds an irreversible side effect");
        }

        let inputs = PolicyInputs {
            has_side_effects: !turn.side_effects.is_empty(),
            phases_done_ratio: 0.0,
            has_pure_artifacts: !turn.phase_artifacts.is_empty(),
            same_topic: true,
            has_compensatable_or_idempotent_effects: turn
                .side_effects
                .iter()
                .any(|se| matches!(se.policy, SideEffectPolicy::Compensatable | SideEffectPolicy::Idempotent)),
            phases_remaining_estimate: f32::INFINITY,
        };
        let action = self.policy.resolve(turn.session_key.agent_id(), inputs);

        match action {
            SupersedeAction::Supersede | SupersedeAction::Absorb => {
                let delivered = self.events.emit(
                    &canonical,
                    GatewayEvent::NewMessage {
                        message_id: envelope.message_id.clone(),
                        content: envelope.content.clone(),
                        received_at: now,
                    },
                );
                if !delivered {
                    warn!(session_key = canonical, "processing turn has no registered workflow to observe supersede signal");
                }
                let decision = SupersedeDecision::new(turn.id, action, 1.0, true);
                Ok(GatewayOutcome {
                    decision: TurnDecision::Supersede(decision),
                    response: IngressResponse::Accepted {
                        turn_id: turn.id,
                        estimated_wait_ms: 0,
                    },
                })
            },
            SupersedeAction::Queue | SupersedeAction::ForceComplete => {
                self.queue_behind(&canonical, &turn, envelope, now, "policy disallowed supersede")
            },
        }
    }

    fn queue_behind(
        &self,
        canonical_session_key: &str,
        turn: &LogicalTurn,
        envelope: InboundEnvelope,
        now: chrono::DateTime<chrono::Utc>,
        reason: &str,
    ) -> GatewayResult<GatewayOutcome> {
        let overflow = self.overflow_config(&envelope.channel);
        if !self.overflow.try_admit(canonical_session_key, now, overflow.max_queued, overflow.window_ms) {
            return Ok(GatewayOutcome {
                decision: TurnDecision::Supersede(SupersedeDecision::new(turn.id, SupersedeAction::Queue, 1.0, false)),
                response: IngressResponse::Rejected {
                    reason: format!("overflow queue full for session {canonical_session_key}"),
                },
            });
        }
        self.overflow.park(canonical_session_key, envelope);

        debug!(session_key = canonical_session_key, reason, "gateway queued a message behind a processing turn");
        Ok(GatewayOutcome {
            decision: TurnDecision::Supersede(SupersedeDecision::new(turn.id, SupersedeAction::Queue, 1.0, false)),
            response: IngressResponse::Queued { deferred: 1 },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acf_brain::policy::PolicyTable;
    use acf_config::{AccumulatorConfig, IdempotencyConfig, MutexConfig, SessionStoreConfig};
    use acf_core::SystemClock;
    use acf_storage::idempotency::MemoryIdempotencyStore;
    use acf_storage::turn::MemoryTurnStore;

    fn test_config() -> AcfConfig {
        let mut channels = HashMap::new();
        channels.insert(
            "web".to_string(),
            acf_config::ChannelConfig {
                default_turn_window_ms: 600,
                typing_indicator_available: true,
                max_message_length: 8192,
                supports_markdown: true,
                supports_rich_media: true,
            },
        );
        let mut overflow = HashMap::new();
        overflow.insert("web".to_string(), OverflowConfig { max_queued: 2, window_ms: 10_000 });

        AcfConfig {
            accumulator: AccumulatorConfig { min_wait_ms: 100, max_wait_ms: 5000 },
            mutex: MutexConfig { lease_ttl_secs: 30, blocking_timeout_secs: 1 },
            session_store: SessionStoreConfig { hot_ttl_secs: 300 },
            idempotency: IdempotencyConfig { api_ttl_secs: 300, beat_ttl_secs: 60, tool_ttl_secs: 86_400 },
            channels,
            overflow,
            tool_policies: HashMap::new(),
        }
    }

    fn envelope(message_id: &str) -> InboundEnvelope {
        InboundEnvelope {
            message_id: message_id.to_string(),
            tenant_id: "acme".to_string(),
            agent_id: "support-bot".to_string(),
            interlocutor_id: "user-1".to_string(),
            channel: "web".to_string(),
            content: "hello there friend".to_string(),
            timestamp: chrono::Utc::now(),
            idempotency_key: None,
        }
    }

    fn gateway() -> TurnGateway {
        TurnGateway::new(
            &test_config(),
            Arc::new(MemoryTurnStore::new()),
            Arc::new(MemoryIdempotencyStore::new(Arc::new(SystemClock))),
            PolicyTable::new(),
            Arc::new(SystemClock),
        )
    }

    #[tokio::test]
    async fn first_message_for_a_session_starts_a_new_turn() {
        let gw = gateway();
        let outcome = gw.ingest(envelope("m1")).await.unwrap();
        assert!(matches!(outcome.decision, TurnDecision::StartNew));
        assert!(matches!(outcome.response, IngressResponse::Accepted { .. }));
    }

    #[tokio::test]
    async fn second_message_against_accumulating_turn_is_absorbed() {
        let gw = gateway();
        gw.ingest(envelope("m1")).await.unwrap();
        let canonical = "acme:support-bot:user-1:web";
        let _rx = gw.events().register(canonical);

        let outcome = gw.ingest(envelope("m2")).await.unwrap();
        assert!(matches!(
            outcome.decision,
            TurnDecision::Accumulation(AccumulationDecision::Absorb)
        ));
    }

    #[tokio::test]
    async fn message_against_irreversible_processing_turn_is_queued() {
        let gw = gateway();
        let outcome = gw.ingest(envelope("m1")).await.unwrap();
        let TurnDecision::StartNew = outcome.decision else {
            panic!("expected a new turn");
        };

        let session_key = SessionKey::new("acme", "support-bot", "user-1", "web").unwrap();
        let mut turn = gw.turn_store.get_active_turn(&session_key).await.unwrap().unwrap();
        turn.enter_processing(acf_core::CompletionReason::Timeout, acf_core::ScenarioSnapshot::default());
        turn.record_side_effect(acf_core::SideEffect::new(
            "charge_card",
            SideEffectPolicy::Irreversible,
            0,
            chrono::Utc::now(),
        ));
        gw.turn_store.save(turn, FencingToken::from_raw(1)).await.unwrap();

        let outcome = gw.ingest(envelope("m2")).await.unwrap();
        assert!(matches!(outcome.response, IngressResponse::Queued { .. }));
    }

    #[tokio::test]
    async fn overflow_cap_rejects_once_exceeded() {
        let gw = gateway();
        gw.ingest(envelope("m1")).await.unwrap();

        let session_key = SessionKey::new("acme", "support-bot", "user-1", "web").unwrap();
        let mut turn = gw.turn_store.get_active_turn(&session_key).await.unwrap().unwrap();
        turn.enter_processing(acf_core::CompletionReason::Timeout, acf_core::ScenarioSnapshot::default());
        turn.record_side_effect(acf_core::SideEffect::new(
            "charge_card",
            SideEffectPolicy::Irreversible,
            0,
            chrono::Utc::now(),
        ));
        gw.turn_store.save(turn, FencingToken::from_raw(1)).await.unwrap();

        gw.ingest(envelope("m2")).await.unwrap();
        gw.ingest(envelope("m3")).await.unwrap();
        let outcome = gw.ingest(envelope("m4")).await.unwrap();
        assert!(matches!(outcome.response, IngressResponse::Rejected { .. }));
    }
}
