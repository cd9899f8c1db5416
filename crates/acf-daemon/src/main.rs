//! `acfd` — standalone daemon binary for the Agent Conversation Fabric.
//!
//! Wires configuration, stores, the session mutex, the Gateway, and the
//! per-session workflow into one running process. Reads newline-delimited
//! [`InboundEnvelope`] JSON from stdin as its demo ingestion surface (ACF
//! ships no real wire-protocol connector; see `acf-channel`'s module docs)
//! and prints delivered replies to stdout.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod health;
mod supervisor;

use std::sync::Arc;

use acf_brain::{DeterministicBrain, PolicyTable};
use acf_channel::{ChannelAdapter, InProcessChannelAdapter, InboundEnvelope};
use acf_config::AcfConfig;
use acf_core::{SessionKey, SystemClock};
use acf_gateway::TurnGateway;
use acf_ledger::ToolPolicyTable;
use acf_mutex::SessionMutex;
use acf_storage::{MemoryIdempotencyStore, MemorySessionTier, MemoryTurnStore, TwoTierSessionStore};
use acf_workflow::LogicalTurnWorkflow;
use anyhow::{Context, Result};
use chrono::Duration;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crate::health::HealthTracker;

/// ACF daemon — background conversation-fabric server.
#[derive(Parser)]
#[command(name = "acfd")]
#[command(author, version, about = "ACF daemon — background conversation-fabric server")]
struct Args {
    /// Path to a TOML file overriding defaults at the tenant layer.
    #[arg(long)]
    tenant_config: Option<std::path::PathBuf>,

    /// Path to a TOML file overriding defaults at the per-agent layer.
    #[arg(long)]
    agent_config: Option<std::path::PathBuf>,

    /// Channel name the demo in-process adapter answers to.
    #[arg(long, default_value = "web")]
    channel: String,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> Result<AcfConfig> {
    let tenant = args
        .tenant_config
        .as_ref()
        .map(|path| std::fs::read_to_string(path).with_context(|| format!("reading tenant config {}", path.display())))
        .transpose()?;
    let agent = args
        .agent_config
        .as_ref()
        .map(|path| std::fs::read_to_string(path).with_context(|| format!("reading agent config {}", path.display())))
        .transpose()?;
    acf_config::load_layered(tenant.as_deref(), agent.as_deref()).context("loading layered ACF configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let log_config = acf_telemetry::LogConfig::new(level).with_format(acf_telemetry::LogFormat::Compact);
    if let Err(e) = acf_telemetry::setup_logging(&log_config) {
        eprintln!("failed to initialize logging: {e}");
    }

    let config = load_config(&args)?;

    let clock = Arc::new(SystemClock);
    let turn_store = Arc::new(MemoryTurnStore::new());
    let hot = Arc::new(MemorySessionTier::new(clock.clone()));
    let persistent = Arc::new(MemorySessionTier::new(clock.clone()));
    let hot_ttl = Duration::seconds(i64::try_from(config.session_store.hot_ttl_secs).unwrap_or(i64::MAX));
    let session_store = Arc::new(TwoTierSessionStore::new(hot, persistent, hot_ttl));
    let api_idempotency = Arc::new(MemoryIdempotencyStore::new(clock.clone()));
    let beat_idempotency = Arc::new(MemoryIdempotencyStore::new(clock.clone()));
    let audit_sink = Arc::new(acf_audit::MemoryAuditSink::new());

    let (channel_adapter, mut outbound_rx) = InProcessChannelAdapter::new(args.channel.clone());
    let channel_adapter: Arc<dyn ChannelAdapter> = Arc::new(channel_adapter);

    let mut tool_policies = ToolPolicyTable::new();
    for (tool_name, policy) in &config.tool_policies {
        tool_policies.declare(tool_name.clone(), *policy);
    }

    let mutex = Arc::new(SessionMutex::new(clock.clone()));

    let gateway = Arc::new(TurnGateway::new(
        &config,
        turn_store.clone(),
        api_idempotency.clone(),
        PolicyTable::new(),
        clock.clone(),
    ));

    let brain: Arc<dyn acf_brain::Brain> = Arc::new(DeterministicBrain::new(1));

    let workflow = Arc::new(LogicalTurnWorkflow::new(
        &config,
        clock.clone(),
        mutex.clone(),
        turn_store.clone(),
        session_store.clone(),
        beat_idempotency.clone(),
        audit_sink.clone(),
        channel_adapter.clone(),
        brain,
        tool_policies,
        gateway.clone(),
    ));

    let health = Arc::new(HealthTracker::new());

    tokio::spawn(async move {
        while let Some(envelope) = outbound_rx.recv().await {
            println!(
                "[{}] {}",
                envelope.session_key.as_canonical(),
                envelope.response_segments.join(" ")
            );
        }
    });

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    let health_handle = {
        let health = health.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(health::DEFAULT_HEALTH_INTERVAL);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    _ = interval.tick() => {
                        let snapshot = health.snapshot();
                        info!(?snapshot, "health check");
                    }
                }
            }
        })
    };

    info!(channel = %args.channel, "acfd listening for newline-delimited InboundEnvelope JSON on stdin");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut ingest_shutdown_rx = shutdown_tx.subscribe();

    loop {
        tokio::select! {
            biased;
            _ = ingest_shutdown_rx.recv() => {
                info!("stdin ingestion loop received shutdown signal");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C");
                let _ = shutdown_tx.send(());
                break;
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => {
                        let envelope: InboundEnvelope = match serde_json::from_str(&line) {
                            Ok(envelope) => envelope,
                            Err(e) => {
                                warn!(error = %e, "failed to parse inbound envelope, dropping line");
                                continue;
                            }
                        };
                        if let Err(e) = handle_inbound(&gateway, &workflow, &health, envelope).await {
                            error!(error = %e, "failed to handle inbound envelope");
                        }
                    }
                    Ok(None) => {
                        info!("stdin closed; shutting down");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "error reading stdin");
                        break;
                    }
                }
            }
        }
    }

    let _ = shutdown_tx.send(());
    health_handle.abort();
    info!("acfd stopped");
    Ok(())
}

async fn handle_inbound<C: acf_core::Clock + 'static>(
    gateway: &Arc<TurnGateway>,
    workflow: &Arc<LogicalTurnWorkflow<C>>,
    health: &Arc<HealthTracker>,
    envelope: InboundEnvelope,
) -> Result<()> {
    let session_key: SessionKey = envelope.session_key()?;
    let outcome = gateway.ingest(envelope).await?;

    if matches!(outcome.decision, acf_core::TurnDecision::StartNew) {
        let workflow = workflow.clone();
        let health = health.clone();
        tokio::spawn(supervisor::drive_session(workflow, health, session_key));
    }

    Ok(())
}
