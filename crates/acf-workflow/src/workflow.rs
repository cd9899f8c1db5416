//! [`LogicalTurnWorkflow`] (C7): drives a single session's active turn from
//! session-mutex acquisition through accumulation, pipeline execution, and
//! commit (§4.7).
//!
//! A workflow instance owns exactly one session for the duration of one
//! `run` call. It never spawns itself or a successor instance; the caller
//! (the supervisor, in `acf-daemon`) reads the returned [`WorkflowOutcome`]
//! and decides whether to spawn a fresh instance for a `followup_turn` or a
//! `successor`. This keeps the dependency graph acyclic: the Gateway
//! classifies, the workflow drives, the daemon supervises.
//!
//! A single acquired lease carries exactly one [`FencingToken`] for its
//! entire lifetime (`renew` extends the lease without minting a new one), and
//! [`acf_storage::turn::TurnStore::save`] rejects a second write for the same
//! turn id at the same token. So every intermediate mutation of the turn
//! this instance owns (absorbing messages, entering PROCESSING) happens only
//! on the in-memory `LogicalTurn`, with exactly one [`TurnStore::save`] call
//! for that turn id at the very end of the run. A freshly spawned successor
//! turn has its own turn id and therefore its own independent fencing
//! history, so its first save is unaffected by this limit — the same way the
//! Gateway's `start_new_turn` always saves at [`FencingToken::zero`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use acf_accumulator::{suggest_wait_ms, AccumulatorInput};
use acf_audit::{AuditSink, Interruption, PhaseArtifactSummary, TurnRecord};
use acf_brain::probe::{InterruptProbe, NeverInterrupt};
use acf_brain::Brain;
use acf_channel::{ChannelAdapter, OutboundEnvelope};
use acf_core::{
    ChannelModel, Clock, CompletionReason, FencingToken, Fingerprint, LogicalTurn, ScenarioSnapshot, Session,
    SessionKey, SupersedeAction, SupersedeDecision, TurnId, TurnResult,
};
use acf_gateway::{GatewayEvent, TurnGateway};
use acf_ledger::{compensate_in_reverse, CompensationOutcome, ToolPolicyTable};
use acf_mutex::{AcquireOutcome, SessionMutex};
use acf_storage::{scoped_key, IdempotencyScope, IdempotencyStore, SharedTurnStore, TwoTierSessionStore};
use chrono::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::{WorkflowError, WorkflowResult};
use crate::outcome::WorkflowOutcome;

/// A probe that reports a fixed answer for the lifetime of one Brain call,
/// computed once from whatever [`GatewayEvent`]s were sitting in the
/// workflow's inbox immediately before that call. The Brain's own
/// `InterruptProbe` contract is a non-blocking peek, not a live feed; a
/// workflow wanting to know whether *new* events arrived during the call
/// itself simply drains the channel again before its next call.
struct StaticProbe(bool);

impl InterruptProbe for StaticProbe {
    fn should_interrupt(&self) -> bool {
        self.0
    }
}

fn drain_pending(rx: &mut mpsc::UnboundedReceiver<GatewayEvent>) -> Vec<GatewayEvent> {
    let mut pending = Vec::new();
    while let Ok(event) = rx.try_recv() {
        pending.push(event);
    }
    pending
}

fn event_message_id(event: &GatewayEvent) -> String {
    match event {
        GatewayEvent::NewMessage { message_id, .. } => message_id.clone(),
    }
}

fn fallback_channel_model(channel: &str) -> ChannelModel {
    match channel {
        "whatsapp" => ChannelModel::whatsapp(),
        "sms" => ChannelModel::sms(),
        "telegram" => ChannelModel::telegram(),
        "email" => ChannelModel::email(),
        "voice" => ChannelModel::voice(),
        _ => ChannelModel::web(),
    }
}

/// The Beat-scope idempotency key for a turn's message set (§3/§4.4):
/// `tenant:hash(sorted message IDs)`, so two turns that end up carrying the
/// exact same messages — e.g. a client retrying an entire webhook delivery —
/// collide on the same key regardless of the turn id or turn-group id each
/// one was assigned.
fn beat_fingerprint(messages: &[String]) -> String {
    let mut sorted = messages.to_vec();
    sorted.sort();
    Fingerprint::of(sorted.join("\u{1}").as_bytes()).to_string()
}

fn beat_key(tenant_id: &str, messages: &[String]) -> String {
    scoped_key(IdempotencyScope::Beat, tenant_id, &beat_fingerprint(messages))
}

fn reply_to_segment(reply: Option<serde_json::Value>) -> String {
    let Some(reply) = reply else {
        return String::new();
    };
    reply
        .get("text")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| reply.to_string())
}

/// Drives exactly one session's active turn per [`LogicalTurnWorkflow::run`]
/// call.
///
/// Holds every dependency a run needs: the session mutex, the turn and
/// session stores, the idempotency/audit/channel/brain boundaries, and the
/// Gateway it shares an [`acf_gateway::event::EventRegistry`] and overflow
/// queue with.
pub struct LogicalTurnWorkflow<C: Clock> {
    clock: Arc<C>,
    mutex: Arc<SessionMutex<C>>,
    turn_store: SharedTurnStore,
    session_store: Arc<TwoTierSessionStore>,
    beat_idempotency: Arc<dyn IdempotencyStore>,
    audit_sink: Arc<dyn AuditSink>,
    channel_adapter: Arc<dyn ChannelAdapter>,
    brain: Arc<dyn Brain>,
    tool_policies: ToolPolicyTable,
    gateway: Arc<TurnGateway>,
    channel_models: HashMap<String, ChannelModel>,
    lease_ttl: Duration,
    blocking_timeout: Duration,
    accumulator_bounds: (u64, u64),
}

impl<C: Clock> LogicalTurnWorkflow<C> {
    /// Build a workflow instance from a merged configuration tree and its
    /// store/boundary dependencies.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &acf_config::AcfConfig,
        clock: Arc<C>,
        mutex: Arc<SessionMutex<C>>,
        turn_store: SharedTurnStore,
        session_store: Arc<TwoTierSessionStore>,
        beat_idempotency: Arc<dyn IdempotencyStore>,
        audit_sink: Arc<dyn AuditSink>,
        channel_adapter: Arc<dyn ChannelAdapter>,
        brain: Arc<dyn Brain>,
        tool_policies: ToolPolicyTable,
        gateway: Arc<TurnGateway>,
    ) -> Self {
        Self {
            clock,
            mutex,
            turn_store,
            session_store,
            beat_idempotency,
            audit_sink,
            channel_adapter,
            brain,
            tool_policies,
            gateway,
            channel_models: config.channel_models(),
            lease_ttl: Duration::seconds(i64::try_from(config.mutex.lease_ttl_secs).unwrap_or(i64::MAX)),
            blocking_timeout: Duration::seconds(i64::try_from(config.mutex.blocking_timeout_secs).unwrap_or(i64::MAX)),
            accumulator_bounds: (config.accumulator.min_wait_ms, config.accumulator.max_wait_ms),
        }
    }

    /// The declared tool side-effect policies this workflow was built with,
    /// for a `Brain` implementation that records its own side effects
    /// through [`acf_ledger::SideEffectLedger`].
    #[must_use]
    pub fn tool_policies(&self) -> &ToolPolicyTable {
        &self.tool_policies
    }

    /// Drive `session_key`'s active turn from mutex acquisition to a
    /// terminal [`WorkflowOutcome`].
    ///
    /// # Errors
    ///
    /// Returns an error only for failures that occurred before this instance
    /// ever held the session mutex (currently none are possible — acquiring
    /// the mutex never itself fails, it only times out, which is reported as
    /// [`WorkflowOutcome::LostMutexRace`]). Every failure observed while the
    /// mutex was held is folded into [`WorkflowOutcome::Aborted`] after a
    /// best-effort compensation pass, so a supervisor never needs a second
    /// error-handling path for "the lease was live but something broke".
    pub async fn run(&self, session_key: SessionKey) -> WorkflowResult<WorkflowOutcome> {
        let canonical = session_key.as_canonical();

        let token = match self.mutex.acquire(&session_key, self.lease_ttl, self.blocking_timeout).await {
            AcquireOutcome::Acquired(token) => token,
            AcquireOutcome::TimedOut => return Ok(WorkflowOutcome::LostMutexRace { session_key }),
        };

        let mut rx = self.gateway.events().register(&canonical);
        info!(session_key = %canonical, %token, "workflow instance acquired session");

        let outcome = self.drive(&session_key, token, &mut rx).await;

        self.gateway.events().deregister(&canonical);
        if let Err(release_err) = self.mutex.release(&session_key, token) {
            warn!(session_key = %canonical, %release_err, "releasing session mutex after run failed; lease will be reclaimed on expiry");
        }

        outcome
    }

    async fn drive(
        &self,
        session_key: &SessionKey,
        token: FencingToken,
        rx: &mut mpsc::UnboundedReceiver<GatewayEvent>,
    ) -> WorkflowResult<WorkflowOutcome> {
        let Some(mut turn) = self.turn_store.get_active_turn(session_key).await? else {
            return Ok(WorkflowOutcome::Aborted {
                turn_id: TurnId::new(),
                reason: "no active turn found for session at workflow start".to_string(),
            });
        };

        match self.run_turn(session_key, token, &mut turn, rx).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                error!(turn_id = %turn.id, %err, "workflow run failed before reaching commit");
                compensate_and_terminate(&mut turn);
                if let Err(save_err) = self.turn_store.save(turn.clone(), token).await {
                    error!(turn_id = %turn.id, %save_err, "failed to persist terminal state after workflow failure; a stale lease reaper must reclaim this session");
                }
                Ok(WorkflowOutcome::Aborted {
                    turn_id: turn.id,
                    reason: err.to_string(),
                })
            },
        }
    }

    async fn run_turn(
        &self,
        session_key: &SessionKey,
        token: FencingToken,
        turn: &mut LogicalTurn,
        rx: &mut mpsc::UnboundedReceiver<GatewayEvent>,
    ) -> WorkflowResult<WorkflowOutcome> {
        let reason = self.accumulate(turn, rx, token, session_key).await?;

        if let Some(cached) = self.check_beat_idempotency(session_key, turn).await? {
            turn.enter_processing(reason, ScenarioSnapshot::default());
            turn.complete();
            self.turn_store.save(turn.clone(), token).await?;
            return Ok(WorkflowOutcome::Committed {
                turn_id: turn.id,
                outbound: cached,
                followup_turn: None,
            });
        }

        let mut session = self
            .session_store
            .get(session_key)
            .await?
            .unwrap_or_else(|| Session::new(session_key.clone(), self.clock.now()));
        let snapshot = ScenarioSnapshot {
            scenario_id: session.active_scenario_id.clone(),
            step_id: session.active_step_id.clone(),
        };
        turn.enter_processing(reason, snapshot);
        self.mutex.renew(session_key, token, self.lease_ttl)?;

        let mut interruptions = Vec::new();
        let mut deferred_message_ids = Vec::new();

        let completed = loop {
            let pending = drain_pending(rx);
            let probe = StaticProbe(!pending.is_empty());
            let artifacts = turn.phase_artifacts.clone();
            let result = self.brain.process_turn(turn, &probe, &artifacts).await;

            let interrupted = match result {
                TurnResult::Completed { .. } => break result,
                TurnResult::Interrupted(interrupted) => interrupted,
            };

            self.mutex.renew(session_key, token, self.lease_ttl)?;

            let mut message_ids: Vec<String> = pending.iter().map(event_message_id).collect();
            if message_ids.is_empty() {
                if let Some(id) = &interrupted.interrupt_message_id {
                    message_ids.push(id.clone());
                }
            }

            let decision = SupersedeDecision::new(turn.id, interrupted.recommended_action, 1.0, turn.can_absorb_message());
            debug!(turn_id = %turn.id, last_phase = interrupted.last_phase, action = ?decision.action, reason = %interrupted.reason, "brain interrupted turn");
            interruptions.push(Interruption {
                last_phase: interrupted.last_phase,
                action: format!("{:?}", decision.action),
                interrupt_message_id: message_ids.first().cloned(),
            });

            match decision.action {
                SupersedeAction::Supersede => {
                    let now = self.clock.now();
                    let mut successor_messages = deferred_message_ids;
                    successor_messages.extend(message_ids);
                    let successor = LogicalTurn::succeed(turn, successor_messages, now);
                    let predecessor_id = turn.id;
                    turn.mark_superseded_by(successor.id);
                    self.turn_store.save(turn.clone(), token).await?;
                    self.turn_store.save(successor.clone(), token).await?;
                    return Ok(WorkflowOutcome::Superseded {
                        predecessor: predecessor_id,
                        successor,
                    });
                },
                SupersedeAction::Absorb | SupersedeAction::Queue => {
                    deferred_message_ids.extend(message_ids);
                },
                SupersedeAction::ForceComplete => {
                    let artifacts = turn.phase_artifacts.clone();
                    let forced = self.brain.process_turn(turn, &NeverInterrupt, &artifacts).await;
                    match forced {
                        TurnResult::Completed { .. } => break forced,
                        TurnResult::Interrupted(_) => return Err(WorkflowError::BrainDidNotComplete(turn.id)),
                    }
                },
            }
        };

        self.commit_and_respond(session_key, token, turn, session, completed, interruptions, deferred_message_ids)
            .await
    }

    /// Check whether this turn's exact message set was already committed
    /// under the Beat scope, short-circuiting re-processing of a
    /// resubmitted message set that arrived without a client
    /// `idempotency_key` (which only covers the API scope).
    async fn check_beat_idempotency(
        &self,
        session_key: &SessionKey,
        turn: &LogicalTurn,
    ) -> WorkflowResult<Option<OutboundEnvelope>> {
        let key = beat_key(session_key.tenant_id(), &turn.messages);
        let Some(cached) = self.beat_idempotency.peek(&key).await? else {
            return Ok(None);
        };
        match serde_json::from_value::<OutboundEnvelope>(cached) {
            Ok(envelope) => Ok(Some(envelope)),
            Err(e) => {
                warn!(%e, key, "cached beat-idempotency value did not deserialize as an OutboundEnvelope");
                Ok(None)
            },
        }
    }

    async fn accumulate(
        &self,
        turn: &mut LogicalTurn,
        rx: &mut mpsc::UnboundedReceiver<GatewayEvent>,
        token: FencingToken,
        session_key: &SessionKey,
    ) -> WorkflowResult<CompletionReason> {
        let channel_model = self
            .channel_models
            .get(session_key.channel())
            .cloned()
            .unwrap_or_else(|| fallback_channel_model(session_key.channel()));

        loop {
            let wait_ms = suggest_wait_ms(
                &AccumulatorInput {
                    message_content: turn.messages.last().map(String::as_str).unwrap_or_default(),
                    channel: &channel_model,
                    user_cadence_p95_ms: None,
                    pipeline_hint: None,
                },
                self.accumulator_bounds.0,
                self.accumulator_bounds.1,
            );

            tokio::select! {
                () = tokio::time::sleep(StdDuration::from_millis(wait_ms)) => {
                    return Ok(CompletionReason::Timeout);
                }
                event = rx.recv() => {
                    match event {
                        Some(GatewayEvent::NewMessage { message_id, received_at, .. }) => {
                            turn.absorb(message_id, received_at);
                            self.mutex.renew(session_key, token, self.lease_ttl)?;
                        }
                        None => return Ok(CompletionReason::Timeout),
                    }
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn commit_and_respond(
        &self,
        session_key: &SessionKey,
        token: FencingToken,
        turn: &mut LogicalTurn,
        mut session: Session,
        completed: TurnResult,
        interruptions: Vec<Interruption>,
        deferred_message_ids: Vec<String>,
    ) -> WorkflowResult<WorkflowOutcome> {
        let TurnResult::Completed {
            scenario_transition,
            reply,
            confidence,
            ..
        } = completed
        else {
            unreachable!("commit_and_respond is only ever called with a Completed result");
        };

        let now = self.clock.now();
        turn.complete();

        if let Some(transition) = &scenario_transition {
            if let (Some(scenario_id), Some(step_id)) = (&transition.scenario_id, &transition.step_id) {
                session.commit_scenario_transition(scenario_id.clone(), "", step_id.clone(), "turn committed", confidence, now);
            }
        }
        self.session_store.save(&session, token).await?;

        let outbound = OutboundEnvelope {
            session_key: turn.session_key.clone(),
            turn_id: turn.id,
            turn_group_id: turn.turn_group_id,
            response_segments: vec![reply_to_segment(reply)],
            emitted_events: Vec::new(),
        };

        let beat_hash = beat_fingerprint(&turn.messages);
        let key = beat_key(session_key.tenant_id(), &turn.messages);
        self.beat_idempotency
            .try_record(
                &key,
                &beat_hash,
                serde_json::to_value(&outbound)?,
                IdempotencyScope::Beat.default_ttl(),
            )
            .await?;

        self.channel_adapter.deliver(outbound.clone()).await?;

        let record = TurnRecord {
            session_key: turn.session_key.clone(),
            turn_id: turn.id,
            turn_group_id: turn.turn_group_id,
            message_sequence: turn.messages.clone(),
            superseded_by: turn.superseded_by,
            interruptions,
            phase_artifact_summaries: turn
                .phase_artifacts
                .values()
                .map(|a| PhaseArtifactSummary { phase: a.phase, reused: false })
                .collect(),
            side_effects: turn.side_effects.clone(),
            latency_ms: (now - turn.first_at).num_milliseconds().max(0) as u64,
            tokens_used: None,
            scenario_before: turn.scenario_states_at_start.clone(),
            scenario_after: scenario_transition.unwrap_or_default(),
            committed_at: now,
        };
        self.audit_sink.record(record).await?;

        self.turn_store.save(turn.clone(), token).await?;

        let mut followup_messages = deferred_message_ids;
        followup_messages.extend(self.gateway.drain_queued(&session_key.as_canonical()).into_iter().map(|e| e.message_id));

        let followup_turn = if followup_messages.is_empty() {
            None
        } else {
            let successor = LogicalTurn::succeed(turn, followup_messages, now);
            self.turn_store.save(successor.clone(), token).await?;
            Some(successor)
        };

        Ok(WorkflowOutcome::Committed {
            turn_id: turn.id,
            outbound,
            followup_turn,
        })
    }
}

/// Compensate every `Compensatable` effect on `turn`, in reverse order, and
/// drive it to a terminal state regardless of whether it ever recorded an
/// irreversible effect — there is no real successor to link on a failure
/// path, so [`LogicalTurn::complete`] is used even though the turn never
/// reached a clean business-level commit (see the module-level asymmetry
/// between `complete` and `mark_superseded_by`).
fn compensate_and_terminate(turn: &mut LogicalTurn) {
    let outcomes = compensate_in_reverse(turn, |effect| {
        warn!(tool_name = %effect.tool_name, "compensating side effect after workflow failure");
        Ok(())
    });
    for outcome in &outcomes {
        if let CompensationOutcome::Failed { tool_name, reason } = outcome {
            error!(tool_name, reason, "compensation failed during failure handling");
        }
    }
    turn.complete();
}

#[cfg(test)]
mod tests {
    use super::*;
    use acf_audit::MemoryAuditSink;
    use acf_brain::DeterministicBrain;
    use acf_channel::InProcessChannelAdapter;
    use acf_config::{AccumulatorConfig, ChannelConfig, IdempotencyConfig, MutexConfig, OverflowConfig, SessionStoreConfig};
    use acf_core::{SystemClock, TurnDecision};
    use acf_storage::{MemoryIdempotencyStore, MemorySessionTier, MemoryTurnStore};
    use std::sync::Arc;

    fn key() -> SessionKey {
        SessionKey::new("acme", "support-bot", "user-1", "web").unwrap()
    }

    fn config() -> acf_config::AcfConfig {
        let mut channels = HashMap::new();
        channels.insert(
            "web".to_string(),
            ChannelConfig {
                default_turn_window_ms: 20,
                typing_indicator_available: true,
                max_message_length: 8192,
                supports_markdown: true,
                supports_rich_media: true,
            },
        );
        let mut overflow = HashMap::new();
        overflow.insert("web".to_string(), OverflowConfig { max_queued: 5, window_ms: 10_000 });

        acf_config::AcfConfig {
            accumulator: AccumulatorConfig { min_wait_ms: 10, max_wait_ms: 40 },
            mutex: MutexConfig { lease_ttl_secs: 30, blocking_timeout_secs: 1 },
            session_store: SessionStoreConfig { hot_ttl_secs: 300 },
            idempotency: IdempotencyConfig { api_ttl_secs: 300, beat_ttl_secs: 60, tool_ttl_secs: 86_400 },
            channels,
            overflow,
            tool_policies: HashMap::new(),
        }
    }

    struct Harness {
        workflow: LogicalTurnWorkflow<SystemClock>,
        gateway: Arc<TurnGateway>,
        turn_store: SharedTurnStore,
        outbound_rx: mpsc::UnboundedReceiver<OutboundEnvelope>,
    }

    fn harness() -> Harness {
        let cfg = config();
        let clock = Arc::new(SystemClock);
        let turn_store: SharedTurnStore = Arc::new(MemoryTurnStore::new());
        let hot = Arc::new(MemorySessionTier::new(clock.clone()));
        let persistent = Arc::new(MemorySessionTier::new(clock.clone()));
        let session_store = Arc::new(TwoTierSessionStore::new(hot, persistent, Duration::minutes(5)));
        let beat_idempotency: Arc<dyn IdempotencyStore> = Arc::new(MemoryIdempotencyStore::new(clock.clone()));
        let audit_sink: Arc<dyn AuditSink> = Arc::new(MemoryAuditSink::new());
        let (adapter, outbound_rx) = InProcessChannelAdapter::new("web");
        let channel_adapter: Arc<dyn ChannelAdapter> = Arc::new(adapter);
        let brain: Arc<dyn Brain> = Arc::new(DeterministicBrain::new(1));

        let gateway = Arc::new(TurnGateway::new(
            &cfg,
            turn_store.clone(),
            Arc::new(MemoryIdempotencyStore::new(clock.clone())),
            acf_brain::PolicyTable::new(),
            clock.clone(),
        ));

        let workflow = LogicalTurnWorkflow::new(
            &cfg,
            clock,
            Arc::new(SessionMutex::new(Arc::new(SystemClock))),
            turn_store.clone(),
            session_store,
            beat_idempotency,
            audit_sink,
            channel_adapter,
            brain,
            ToolPolicyTable::new(),
            gateway.clone(),
        );

        Harness {
            workflow,
            gateway,
            turn_store,
            outbound_rx,
        }
    }

    fn envelope(message_id: &str) -> acf_channel::InboundEnvelope {
        acf_channel::InboundEnvelope {
            message_id: message_id.to_string(),
            tenant_id: "acme".to_string(),
            agent_id: "support-bot".to_string(),
            interlocutor_id: "user-1".to_string(),
            channel: "web".to_string(),
            content: "hello there".to_string(),
            timestamp: chrono::Utc::now(),
            idempotency_key: None,
        }
    }

    #[tokio::test]
    async fn a_single_message_runs_to_commit_and_delivers_a_reply() {
        let mut h = harness();
        let outcome = h.gateway.ingest(envelope("m1")).await.unwrap();
        assert!(matches!(outcome.decision, TurnDecision::StartNew));

        let result = h.workflow.run(key()).await.unwrap();
        match result {
            WorkflowOutcome::Committed { outbound, followup_turn, .. } => {
                assert!(!outbound.response_segments.is_empty());
                assert!(followup_turn.is_none());
            },
            other => panic!("expected a commit, got {other:?}"),
        }

        let delivered = h.outbound_rx.try_recv().expect("adapter should have received the envelope");
        assert_eq!(delivered.response_segments, vec!["acknowledged".to_string()]);
    }

    #[tokio::test]
    async fn resubmitting_the_same_message_set_returns_the_prior_reply_without_reprocessing() {
        let mut h = harness();
        h.gateway.ingest(envelope("m1")).await.unwrap();
        let first = h.workflow.run(key()).await.unwrap();
        let WorkflowOutcome::Committed { outbound: first_outbound, .. } = first else {
            panic!("expected the first submission to commit");
        };
        let _ = h.outbound_rx.try_recv().expect("first submission should have delivered a reply");

        // The same message id arrives again with no active turn in progress
        // (e.g. a webhook retry); the Gateway treats it as a fresh turn, but
        // its message set is identical to the one already committed.
        h.gateway.ingest(envelope("m1")).await.unwrap();
        let second = h.workflow.run(key()).await.unwrap();
        match second {
            WorkflowOutcome::Committed { outbound, followup_turn, .. } => {
                assert_eq!(outbound.response_segments, first_outbound.response_segments);
                assert!(followup_turn.is_none());
            },
            other => panic!("expected the resubmission to short-circuit to a commit, got {other:?}"),
        }
        assert!(
            h.outbound_rx.try_recv().is_err(),
            "a deduplicated resubmission must not be redelivered to the channel"
        );
    }

    #[tokio::test]
    async fn a_second_message_absorbed_during_accumulation_is_carried_into_the_turn() {
        let mut h = harness();
        h.gateway.ingest(envelope("m1")).await.unwrap();

        let turn_before = h.turn_store.get_active_turn(&key()).await.unwrap().unwrap();
        let turn_id = turn_before.id;

        let run = tokio::spawn({
            let workflow_key = key();
            let gateway = h.gateway.clone();
            async move {
                // Register happens inside `run`, so give it a brief head start
                // before emitting the second message through the Gateway.
                tokio::time::sleep(StdDuration::from_millis(1)).await;
                gateway.ingest(envelope("m2")).await.unwrap();
                let _ = workflow_key;
            }
        });

        let outcome = h.workflow.run(key()).await.unwrap();
        run.await.unwrap();

        match outcome {
            WorkflowOutcome::Committed { turn_id: committed_id, .. } => {
                assert_eq!(committed_id, turn_id);
                let committed = h.turn_store.get(turn_id).await.unwrap().unwrap();
                assert_eq!(committed.messages.len(), 2);
            },
            other => panic!("expected a commit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_active_turn_is_reported_as_aborted() {
        let h = harness();
        let outcome = h.workflow.run(key()).await.unwrap();
        assert!(matches!(outcome, WorkflowOutcome::Aborted { .. }));
    }

    #[tokio::test]
    async fn contended_session_reports_lost_mutex_race() {
        let h = harness();
        h.gateway.ingest(envelope("m1")).await.unwrap();

        let held = h.workflow.mutex.acquire(&key(), Duration::seconds(30), Duration::milliseconds(50)).await;
        assert!(matches!(held, AcquireOutcome::Acquired(_)));

        let outcome = h.workflow.run(key()).await.unwrap();
        assert!(matches!(outcome, WorkflowOutcome::LostMutexRace { .. }));
    }

    #[test]
    fn static_probe_reports_its_fixed_value() {
        assert!(StaticProbe(true).should_interrupt());
        assert!(!StaticProbe(false).should_interrupt());
    }

    #[test]
    fn reply_extracts_the_text_field_when_present() {
        let reply = Some(serde_json::json!({ "text": "hi there" }));
        assert_eq!(reply_to_segment(reply), "hi there");
    }

    #[test]
    fn reply_falls_back_to_the_raw_json_when_no_text_field() {
        let reply = Some(serde_json::json!({ "other": 1 }));
        assert_eq!(reply_to_segment(reply), "{\"other\":1}");
    }

    #[test]
    fn no_reply_yields_an_empty_segment() {
        assert_eq!(reply_to_segment(None), "");
    }

    #[test]
    fn compensate_and_terminate_completes_even_with_no_irreversible_effect() {
        let mut turn = LogicalTurn::start(key(), "m1", chrono::Utc::now());
        compensate_and_terminate(&mut turn);
        assert!(turn.status.is_terminal());
    }
}
