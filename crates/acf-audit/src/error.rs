//! Audit sink error types.

use thiserror::Error;

/// Errors that can occur writing or reading audit records.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The backing store could not be reached or returned a failure.
    #[error("audit storage error: {0}")]
    Storage(String),

    /// A record with this turn id was already committed and is immutable.
    #[error("audit record already committed for turn {turn_id}")]
    AlreadyCommitted {
        /// The turn id whose record already exists.
        turn_id: String,
    },
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
