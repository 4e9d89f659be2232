use std::sync::atomic::{AtomicBool, Ordering};

/// Non-blocking mutual exclusion for refresh passes.
#[derive(Debug, Default)]
pub struct RefreshGuard {
    busy: AtomicBool,
}

impl RefreshGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a permit, or `None` immediately when a pass holds the guard.
    pub fn try_acquire(&self) -> Option<RefreshPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshPermit { guard: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the duration of one pass; dropping it frees the guard.
#[derive(Debug)]
pub struct RefreshPermit<'a> {
    guard: &'a RefreshGuard,
}

impl Drop for RefreshPermit<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}
