//! Convenience re-exports for downstream crates.

pub use crate::clock::ManualClock;
pub use crate::fixtures::*;
pub use crate::mocks::*;
pub use crate::stores::*;
