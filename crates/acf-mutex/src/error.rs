//! Errors for the session mutex.

/// Errors returned by [`crate::SessionMutex`] operations other than
/// `acquire`, which reports failure through [`crate::AcquireOutcome`]
/// instead — acquiring never errors, it only ever times out.
#[derive(Debug, thiserror::Error)]
pub enum MutexError {
    /// `renew` or `release` was called with a token that does not match
    /// the lease currently held for the key — either the lease was never
    /// held with that token, or a newer holder has since acquired it.
    #[error("caller does not hold the lease for this session (stale or unknown token)")]
    NotHeld,

    /// `renew` was called after the lease had already expired; a
    /// replacement holder may already be in flight and this holder must
    /// not act further.
    #[error("lease already expired")]
    Expired,
}
