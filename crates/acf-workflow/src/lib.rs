//! ACF Workflow (C7) — drives a single session's [`acf_core::LogicalTurn`]
//! from mutex acquisition through accumulation, pipeline execution, and
//! commit. See [`workflow::LogicalTurnWorkflow`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod outcome;
pub mod workflow;

pub mod prelude;

pub use error::{WorkflowError, WorkflowResult};
pub use outcome::WorkflowOutcome;
pub use workflow::LogicalTurnWorkflow;
