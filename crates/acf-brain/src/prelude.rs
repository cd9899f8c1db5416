//! Convenience re-exports for downstream crates.

pub use crate::brain::{Brain, DeterministicBrain};
pub use crate::policy::{default_action, PolicyInputs, PolicyTable};
pub use crate::probe::{FlagProbe, InterruptProbe, NeverInterrupt};
