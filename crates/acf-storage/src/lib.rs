//! ACF Storage — the two-tier session store, turn store, and three-scope
//! idempotency layer (§4.2–§4.4).
//!
//! - [`session::TwoTierSessionStore`]: hot + persistent [`session::SessionTier`]
//!   with promotion on miss.
//! - [`turn::TurnStore`]: `LogicalTurn` CRUD with an active-turn uniqueness
//!   invariant.
//! - [`idempotency::IdempotencyStore`]: the API/Beat/Tool dedup scopes.
//!
//! Enable the `db` feature for the `SurrealDB`/`SurrealKV`-backed persistent
//! tier; the in-memory tiers are always available and are sufficient for
//! single-process deployments and all tests.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod idempotency;
pub mod session;
pub mod turn;

#[cfg(feature = "db")]
pub mod surreal;

pub mod prelude;

pub use error::{StorageError, StorageResult};
pub use idempotency::{scoped_key, IdempotencyOutcome, IdempotencyScope, IdempotencyStore, MemoryIdempotencyStore};
pub use session::{MemorySessionTier, SessionTier, TwoTierSessionStore};
pub use turn::{MemoryTurnStore, SharedTurnStore, TurnStore};

#[cfg(feature = "db")]
pub use surreal::SurrealSessionTier;
