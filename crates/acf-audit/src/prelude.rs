//! Convenience re-exports for downstream crates.

pub use crate::error::{AuditError, AuditResult};
pub use crate::record::{Interruption, PhaseArtifactSummary, TurnRecord};
pub use crate::sink::{AuditSink, MemoryAuditSink};
