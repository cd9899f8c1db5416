//! ACF Brain — the pluggable cognitive-engine boundary: the [`Brain`]
//! trait, the cooperative [`InterruptProbe`], and the default
//! supersede/absorb/queue policy table of §4.8.
//!
//! ACF does not ship a real Brain; rule matching, retrieval, and generation
//! are out of scope. [`DeterministicBrain`] exists only so the workspace
//! builds and integration tests can drive a turn through ACF end to end.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod brain;
pub mod policy;
pub mod probe;

pub mod prelude;

pub use brain::{Brain, DeterministicBrain};
pub use policy::{default_action, PolicyInputs, PolicyTable};
pub use probe::{FlagProbe, InterruptProbe, NeverInterrupt};
