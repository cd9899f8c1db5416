//! ACF Mutex (C1) — the exclusive, leased, fenced per-session lock held
//! across `LogicalTurnWorkflow` steps (§4.1).
//!
//! The lock is not scoped to a single critical section: a workflow
//! instance acquires it in Step A and releases it only in a terminal step,
//! renewing the lease between steps so a crashed holder is reaped by lease
//! expiry rather than held forever. Fencing tokens (one per successful
//! acquisition) let every store reject writes from a holder whose lease
//! has since lapsed, even if that holder is still running.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod prelude;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use acf_core::{Clock, FencingToken, FencingTokenIssuer, SessionKey};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Notify;

pub use error::MutexError;

/// The result of [`SessionMutex::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The lock was acquired; the caller now owns the returned fencing
    /// token until it releases, lets the lease expire, or is reaped.
    Acquired(FencingToken),
    /// `blocking_timeout` elapsed with the lock still held by another
    /// party. Per §4.1, the caller (the Gateway) does not itself contend
    /// further; it signals the incumbent workflow through an event.
    TimedOut,
}

struct Lease {
    token: FencingToken,
    expires_at: DateTime<Utc>,
}

/// How often a blocked `acquire` call re-checks the lease when it has no
/// explicit release notification to wait on (i.e. while waiting only for
/// lease expiry).
const EXPIRY_POLL_INTERVAL: StdDuration = StdDuration::from_millis(25);

/// The leased, fenced per-session mutex.
pub struct SessionMutex<C: Clock> {
    clock: Arc<C>,
    issuer: FencingTokenIssuer,
    leases: DashMap<String, Lease>,
    waiters: DashMap<String, Arc<Notify>>,
}

impl<C: Clock> SessionMutex<C> {
    /// Construct an empty mutex table using `clock` to evaluate lease
    /// expiry.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            clock,
            issuer: FencingTokenIssuer::new(),
            leases: DashMap::new(),
            waiters: DashMap::new(),
        }
    }

    fn waiter(&self, canonical: &str) -> Arc<Notify> {
        self.waiters.entry(canonical.to_string()).or_insert_with(|| Arc::new(Notify::new())).clone()
    }

    fn try_acquire(&self, canonical: &str, lease_ttl: Duration) -> Option<FencingToken> {
        let now = self.clock.now();
        let expired = self.leases.get(canonical).is_none_or(|lease| lease.expires_at <= now);
        if !expired {
            return None;
        }
        let token = self.issuer.issue();
        self.leases.insert(
            canonical.to_string(),
            Lease {
                token,
                expires_at: now + lease_ttl,
            },
        );
        Some(token)
    }

    /// Acquire the lock for `session_key`, waiting up to `blocking_timeout`
    /// for an incumbent holder to release or its lease to expire.
    ///
    /// Tracing: emits a `debug` event on acquisition and a `warn` event on
    /// timeout (mutex contention is operationally interesting).
    pub async fn acquire(&self, session_key: &SessionKey, lease_ttl: Duration, blocking_timeout: Duration) -> AcquireOutcome {
        let canonical = session_key.as_canonical();
        if let Some(token) = self.try_acquire(&canonical, lease_ttl) {
            tracing::debug!(session_key = %canonical, token = %token, "session mutex acquired");
            return AcquireOutcome::Acquired(token);
        }

        let deadline = self.clock.now() + blocking_timeout;
        loop {
            let remaining = deadline - self.clock.now();
            if remaining <= Duration::zero() {
                tracing::warn!(session_key = %canonical, "session mutex acquire timed out");
                return AcquireOutcome::TimedOut;
            }
            let notify = self.waiter(&canonical);
            let wait = remaining.to_std().unwrap_or(StdDuration::ZERO).min(EXPIRY_POLL_INTERVAL);
            let _ = tokio::time::timeout(wait, notify.notified()).await;

            if let Some(token) = self.try_acquire(&canonical, lease_ttl) {
                tracing::debug!(session_key = %canonical, token = %token, "session mutex acquired after wait");
                return AcquireOutcome::Acquired(token);
            }
        }
    }

    /// Extend the lease on an already-held lock. Called by the workflow
    /// between durable steps.
    ///
    /// # Errors
    ///
    /// Returns [`MutexError::NotHeld`] if `token` does not match the
    /// current lease, or [`MutexError::Expired`] if the lease held with
    /// this token has already lapsed.
    pub fn renew(&self, session_key: &SessionKey, token: FencingToken, lease_ttl: Duration) -> Result<(), MutexError> {
        let canonical = session_key.as_canonical();
        let mut lease = self.leases.get_mut(&canonical).ok_or(MutexError::NotHeld)?;
        if lease.token != token {
            return Err(MutexError::NotHeld);
        }
        let now = self.clock.now();
        if lease.expires_at <= now {
            return Err(MutexError::Expired);
        }
        lease.expires_at = now + lease_ttl;
        Ok(())
    }

    /// Release the lock, waking any waiter so it can immediately retry.
    ///
    /// # Errors
    ///
    /// Returns [`MutexError::NotHeld`] if `token` does not match the
    /// current lease (already released, expired and reclaimed, or never
    /// held).
    pub fn release(&self, session_key: &SessionKey, token: FencingToken) -> Result<(), MutexError> {
        let canonical = session_key.as_canonical();
        {
            let lease = self.leases.get(&canonical).ok_or(MutexError::NotHeld)?;
            if lease.token != token {
                return Err(MutexError::NotHeld);
            }
        }
        self.leases.remove(&canonical);
        tracing::debug!(session_key = %canonical, token = %token, "session mutex released");
        if let Some(notify) = self.waiters.get(&canonical) {
            notify.notify_waiters();
        }
        Ok(())
    }

    /// Administrative unconditional release, regardless of the current
    /// token. Used to recover a session stuck behind an operator-confirmed
    /// dead holder.
    pub fn force_release(&self, session_key: &SessionKey) {
        let canonical = session_key.as_canonical();
        self.leases.remove(&canonical);
        tracing::warn!(session_key = %canonical, "session mutex force-released");
        if let Some(notify) = self.waiters.get(&canonical) {
            notify.notify_waiters();
        }
    }

    /// Whether `session_key` currently has a live (non-expired) lease.
    #[must_use]
    pub fn is_held(&self, session_key: &SessionKey) -> bool {
        let canonical = session_key.as_canonical();
        self.leases.get(&canonical).is_some_and(|lease| lease.expires_at > self.clock.now())
    }
}
