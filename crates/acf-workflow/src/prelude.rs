//! Convenience re-exports for downstream crates.

pub use crate::error::{WorkflowError, WorkflowResult};
pub use crate::outcome::WorkflowOutcome;
pub use crate::workflow::LogicalTurnWorkflow;
