//! The cooperative cancellation probe a Brain consults between phases.
//!
//! The probe is a one-shot, non-blocking peek, not a cancellation token the
//! Brain waits on: "is a new message pending against this turn, and does the
//! turn still have no irreversible side effect recorded?" Implementations
//! must never block.

/// Queried by the Brain before executing any phase with non-`PURE` side
/// effects.
pub trait InterruptProbe: Send + Sync {
    /// Non-blocking check: true iff the turn should stop and hand control
    /// back to the workflow.
    fn should_interrupt(&self) -> bool;
}

/// A probe that never interrupts, for Brain implementations or tests that
/// want to run a pipeline to completion unconditionally.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverInterrupt;

impl InterruptProbe for NeverInterrupt {
    fn should_interrupt(&self) -> bool {
        false
    }
}

/// A probe backed by a shared flag, for tests that want to flip interruption
/// on partway through a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct FlagProbe {
    flag: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl FlagProbe {
    /// Create a probe that starts clear (no interrupt).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag so the next `should_interrupt` call returns true.
    pub fn trip(&self) {
        self.flag.store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

impl InterruptProbe for FlagProbe {
    fn should_interrupt(&self) -> bool {
        self.flag.load(std::sync::atomic::Ordering::SeqCst)
    }
}
