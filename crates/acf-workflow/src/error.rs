//! Workflow error taxonomy: the union of every store/lock/channel failure a
//! `LogicalTurnWorkflow` run can surface.

use thiserror::Error;

/// Errors produced while running a single turn through the workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A store backing the workflow failed.
    #[error(transparent)]
    Storage(#[from] acf_storage::StorageError),

    /// The session mutex rejected a renew/release call.
    #[error(transparent)]
    Mutex(#[from] acf_mutex::MutexError),

    /// The audit sink rejected a commit.
    #[error(transparent)]
    Audit(#[from] acf_audit::AuditError),

    /// The channel adapter could not deliver the committed response.
    #[error(transparent)]
    Channel(#[from] acf_channel::ChannelError),

    /// A core invariant (session key construction, turn transition) was
    /// violated.
    #[error(transparent)]
    Core(#[from] acf_core::CoreError),

    /// `acquire_mutex` timed out before this workflow ever took ownership of
    /// the turn; not really a failure, surfaced as an error only so callers
    /// that don't care about the distinction can use `?` freely.
    #[error("mutex acquisition timed out for session {0}")]
    MutexTimedOut(String),

    /// A value that must round-trip through JSON (an idempotency payload, an
    /// outbound envelope cached for dedup) failed to encode.
    #[error(transparent)]
    Encoding(#[from] serde_json::Error),

    /// Forcing a turn to finish with a non-interrupting probe still did not
    /// yield a completed result. Indicates a non-conformant `Brain`.
    #[error("brain did not complete turn {0} after forcing completion")]
    BrainDidNotComplete(acf_core::TurnId),
}

/// Result alias used throughout `acf-workflow`.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
