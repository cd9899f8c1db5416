//! Convenience re-exports for downstream crates.

pub use crate::{compensate_in_reverse, CompensationOutcome, SideEffectLedger, ToolPolicyTable};
