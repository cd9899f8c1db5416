//! Convenience re-exports for downstream crates.

pub use crate::error::MutexError;
pub use crate::{AcquireOutcome, SessionMutex};
