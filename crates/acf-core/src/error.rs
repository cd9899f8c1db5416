//! Core error types shared by the data model.

use thiserror::Error;

/// Errors that can occur while constructing or validating core types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A session key string did not have the `tenant:agent:interlocutor:channel` shape.
    #[error("invalid session key {key:?}: {reason}")]
    InvalidSessionKey {
        /// The offending key string.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A turn was asked to transition into a state its current status forbids.
    #[error("invalid turn transition: {turn_id} from {from:?} to {to:?}")]
    InvalidTurnTransition {
        /// The turn being transitioned.
        turn_id: String,
        /// The status it was in.
        from: String,
        /// The status that was rejected.
        to: String,
    },

    /// A completion confidence value fell outside `[0, 1]`.
    #[error("completion confidence {0} out of range [0, 1]")]
    ConfidenceOutOfRange(f32),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
