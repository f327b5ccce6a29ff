//! In-flight request gate.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts outstanding network calls so callers can tell when a batch has
/// fully drained.
///
/// Acquired immediately before a request is dispatched and released once
/// its outcome is known. Releasing more times than acquired is a
/// programming bug; the counter panics instead of going silently wrong.
#[derive(Debug, Default)]
pub struct Gate {
    in_flight: AtomicUsize,
}

impl Gate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    /// # Panics
    ///
    /// Panics if called without a matching [`Gate::acquire`].
    pub fn release(&self) {
        let result = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        assert!(result.is_ok(), "gate released without a matching acquire");
    }

    /// True while any request is outstanding.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}
