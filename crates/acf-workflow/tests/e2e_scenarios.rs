//! Cross-crate end-to-end scenarios for the Gateway/Workflow/Mutex/Storage
//! interaction, each keyed to one of the concrete walkthroughs the control
//! plane is specified against.

use std::collections::HashMap;
use std::sync::Arc;

use acf_audit::MemoryAuditSink;
use acf_brain::{Brain, DeterministicBrain};
use acf_channel::{ChannelAdapter, InProcessChannelAdapter, InboundEnvelope};
use acf_config::{
    AccumulatorConfig, AcfConfig, ChannelConfig, IdempotencyConfig, MutexConfig, OverflowConfig, SessionStoreConfig,
};
use acf_core::{FencingToken, SessionKey};
use acf_gateway::TurnGateway;
use acf_ledger::ToolPolicyTable;
use acf_mutex::{AcquireOutcome, SessionMutex};
use acf_storage::{
    IdempotencyStore, MemoryIdempotencyStore, MemorySessionTier, MemoryTurnStore, SessionTier, SharedTurnStore, TurnStore,
    TwoTierSessionStore,
};
use acf_test::ManualClock;
use acf_workflow::{LogicalTurnWorkflow, WorkflowOutcome};
use chrono::Duration;

fn key_on(channel: &str) -> SessionKey {
    SessionKey::new("acme", "support-bot", "shopper-1", channel).unwrap()
}

fn config_for(channel: &str, min_wait_ms: u64, max_wait_ms: u64) -> AcfConfig {
    let mut channels = HashMap::new();
    channels.insert(
        channel.to_string(),
        ChannelConfig {
            default_turn_window_ms: min_wait_ms,
            typing_indicator_available: true,
            max_message_length: 8192,
            supports_markdown: true,
            supports_rich_media: true,
        },
    );
    let mut overflow = HashMap::new();
    overflow.insert(channel.to_string(), OverflowConfig { max_queued: 5, window_ms: 10_000 });

    AcfConfig {
        accumulator: AccumulatorConfig { min_wait_ms, max_wait_ms },
        mutex: MutexConfig { lease_ttl_secs: 30, blocking_timeout_secs: 1 },
        session_store: SessionStoreConfig { hot_ttl_secs: 300 },
        idempotency: IdempotencyConfig { api_ttl_secs: 300, beat_ttl_secs: 60, tool_ttl_secs: 86_400 },
        channels,
        overflow,
        tool_policies: HashMap::new(),
    }
}

fn envelope(channel: &str, message_id: &str, content: &str) -> InboundEnvelope {
    InboundEnvelope {
        message_id: message_id.to_string(),
        tenant_id: "acme".to_string(),
        agent_id: "support-bot".to_string(),
        interlocutor_id: "shopper-1".to_string(),
        channel: channel.to_string(),
        content: content.to_string(),
        timestamp: chrono::Utc::now(),
        idempotency_key: None,
    }
}

struct Rig {
    gateway: Arc<TurnGateway>,
    workflow: LogicalTurnWorkflow<acf_core::SystemClock>,
    turn_store: SharedTurnStore,
}

fn rig(channel: &str, phase_count: u32, min_wait_ms: u64, max_wait_ms: u64) -> Rig {
    let cfg = config_for(channel, min_wait_ms, max_wait_ms);
    let clock = Arc::new(acf_core::SystemClock);
    let turn_store: SharedTurnStore = Arc::new(MemoryTurnStore::new());
    let hot = Arc::new(MemorySessionTier::new(clock.clone()));
    let persistent = Arc::new(MemorySessionTier::new(clock.clone()));
    let session_store = Arc::new(TwoTierSessionStore::new(hot, persistent, Duration::minutes(5)));
    let beat_idempotency: Arc<dyn IdempotencyStore> = Arc::new(MemoryIdempotencyStore::new(clock.clone()));
    let audit_sink: Arc<dyn acf_audit::AuditSink> = Arc::new(MemoryAuditSink::new());
    let (adapter, _outbound_rx) = InProcessChannelAdapter::new(channel);
    let channel_adapter: Arc<dyn ChannelAdapter> = Arc::new(adapter);
    let brain: Arc<dyn Brain> = Arc::new(DeterministicBrain::new(phase_count));

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
        Arc::new(SessionMutex::new(Arc::new(acf_core::SystemClock))),
        turn_store.clone(),
        session_store,
        beat_idempotency,
        audit_sink,
        channel_adapter,
        brain,
        ToolPolicyTable::new(),
        gateway.clone(),
    );

    Rig { gateway, workflow, turn_store }
}

/// Scenario 1 — rapid double message (web, "Hello" then "How are you?" at
/// t+300ms) lands in one turn with both messages and a single outbound
/// reply, never two.
#[tokio::test]
async fn rapid_double_message_is_absorbed_into_one_turn() {
    let rig = rig("web", 1, 200, 400);
    rig.gateway.ingest(envelope("web", "m1", "Hello")).await.unwrap();

    let turn_before = rig.turn_store.get_active_turn(&key_on("web")).await.unwrap().unwrap();
    let turn_id = turn_before.id;

    let second = tokio::spawn({
        let gateway = rig.gateway.clone();
        async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            gateway.ingest(envelope("web", "m2", "How are you?")).await.unwrap();
        }
    });

    let outcome = rig.workflow.run(key_on("web")).await.unwrap();
    second.await.unwrap();

    match outcome {
        WorkflowOutcome::Committed { turn_id: committed_id, followup_turn, .. } => {
            assert_eq!(committed_id, turn_id);
            assert!(followup_turn.is_none());
            let committed = rig.turn_store.get(turn_id).await.unwrap().unwrap();
            assert_eq!(committed.messages, vec!["m1".to_string(), "m2".to_string()]);
        },
        other => panic!("expected a commit absorbing both messages, got {other:?}"),
    }
}

/// Scenarios 2 and 3 — the supersede-vs-queue classification a message
/// arriving mid-PROCESSING receives — are exercised directly against
/// `TurnGateway::ingest` in `acf-gateway`'s own integration tests rather than
/// here: that classification is a synchronous, deterministic function of
/// turn state and policy, and pinning it down needs no live workflow race.

/// Scenario 4 — crashed worker reaped: a holder that never releases its
/// lease is reclaimed once the lease expires, issuing a strictly greater
/// fencing token; the crashed holder's own (stale) token can no longer
/// write the turn it once owned.
#[tokio::test]
async fn a_crashed_holders_lease_is_reaped_and_its_writes_are_fenced() {
    let clock = Arc::new(ManualClock::epoch());
    let mutex = SessionMutex::new(clock.clone());
    let session_key = key_on("web");

    let lease_ttl = Duration::seconds(30);
    let stale_token = match mutex.acquire(&session_key, lease_ttl, Duration::seconds(1)).await {
        AcquireOutcome::Acquired(token) => token,
        AcquireOutcome::TimedOut => panic!("first acquire on an empty mutex must succeed"),
    };

    // The holder crashes here without releasing or renewing.
    clock.advance(Duration::seconds(31));

    let fresh_token = match mutex.acquire(&session_key, lease_ttl, Duration::seconds(1)).await {
        AcquireOutcome::Acquired(token) => token,
        AcquireOutcome::TimedOut => panic!("acquire after lease expiry must reclaim the session"),
    };
    assert!(fresh_token > stale_token);

    let turn_store = MemoryTurnStore::new();
    let turn = acf_test::test_turn(session_key.clone());
    let turn_id = turn.id;
    turn_store.save(turn.clone(), fresh_token).await.unwrap();

    let write_with_stale_token = turn_store.save(turn, stale_token).await;
    assert!(write_with_stale_token.is_err(), "a write carrying the crashed holder's stale token must be rejected");

    let still_held_by_fresh_writer = turn_store.get(turn_id).await.unwrap();
    assert!(still_held_by_fresh_writer.is_some());
}

/// Scenario 6 — hot-tier eviction: a session goes idle past the hot TTL,
/// the hot tier lazily evicts it, and the next read promotes it back from
/// the persistent tier with its state intact.
#[tokio::test]
async fn idle_session_is_promoted_back_from_the_persistent_tier_on_hot_miss() {
    let clock = Arc::new(ManualClock::epoch());
    let hot = Arc::new(MemorySessionTier::new(clock.clone()));
    let persistent = Arc::new(MemorySessionTier::new(clock.clone()));
    let hot_ttl = Duration::minutes(5);
    let store = TwoTierSessionStore::new(hot.clone(), persistent, hot_ttl);

    let session_key = key_on("web");
    let session = acf_core::Session::new(session_key.clone(), clock.now());
    store.save(&session, FencingToken::from_raw(1)).await.unwrap();

    clock.advance(Duration::minutes(6));
    assert!(
        hot.get(&session_key).await.unwrap().is_none(),
        "the hot tier should have lazily expired the idle session"
    );

    let lease_token = FencingToken::from_raw(2);
    let promoted = store.get(&session_key).await.unwrap().expect("persistent tier still has it");
    assert_eq!(promoted.session_key, session_key);
    assert_eq!(promoted.turn_count, session.turn_count);

    assert!(
        hot.get(&session_key).await.unwrap().is_some(),
        "the read should have re-promoted the session into the hot tier"
    );

    // The lease that triggered the promotion is the same one that commits
    // the turn moments later — that commit's `save` must not be rejected
    // as a fencing regression against the token the promotion just wrote.
    store
        .save(&promoted, lease_token)
        .await
        .expect("committing under the same lease token that triggered promotion must succeed");
}
