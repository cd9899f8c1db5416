//! Convenience re-exports for downstream crates.

pub use crate::{suggest_wait_ms, AccumulatorInput, PipelineHint};
