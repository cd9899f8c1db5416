//! Storage error taxonomy.

use acf_core::SessionKey;

/// Errors produced by any ACF store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend could not be reached or initialized.
    #[error("storage connection failed: {0}")]
    Connection(String),

    /// A write carried a fencing token that was not strictly greater than
    /// the last token this store observed for the key — the hallmark of a
    /// stale writer losing a commit race.
    #[error("fencing token regression for {key}: incoming {incoming}, last seen {last_seen}")]
    FencingRegression {
        /// The session key the write targeted.
        key: SessionKey,
        /// The token the rejected write carried.
        incoming: u64,
        /// The most recent token this store has accepted for the key.
        last_seen: u64,
    },

    /// A conditional write failed its uniqueness precondition (e.g. the
    /// turn-store's "at most one active turn per session" invariant).
    #[error("conditional write violated uniqueness invariant: {0}")]
    UniquenessViolation(String),

    /// An idempotency key was reused with a payload hash that does not
    /// match the one recorded for it. Callers must fail closed.
    #[error("idempotency key collision: key already bound to a different payload")]
    IdempotencyConflict,

    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The underlying backend reported a query/serialization failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result alias used throughout `acf-storage`.
pub type StorageResult<T> = Result<T, StorageError>;
