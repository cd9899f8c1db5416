//! ACF Audit — the append-only fact log committed for every completed
//! turn.
//!
//! This is a plain audit trail, not a signed hash-chain: verifying
//! tamper-evidence is a capability-security concern this crate leaves to
//! its caller. What it guarantees is write-once-per-turn and session-scoped
//! retrieval, matching the commit contract of §4.10 and the `TurnRecord`
//! shape of §6.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod record;
pub mod sink;

pub mod prelude;

pub use error::{AuditError, AuditResult};
pub use record::{Interruption, PhaseArtifactSummary, TurnRecord};
pub use sink::{AuditSink, MemoryAuditSink};
