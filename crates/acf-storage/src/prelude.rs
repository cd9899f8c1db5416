//! Convenience re-exports for downstream crates.

pub use crate::error::{StorageError, StorageResult};
pub use crate::idempotency::{scoped_key, IdempotencyOutcome, IdempotencyScope, IdempotencyStore, MemoryIdempotencyStore};
pub use crate::session::{MemorySessionTier, SessionTier, TwoTierSessionStore};
pub use crate::turn::{MemoryTurnStore, SharedTurnStore, TurnStore};

#[cfg(feature = "db")]
pub use crate::surreal::SurrealSessionTier;
