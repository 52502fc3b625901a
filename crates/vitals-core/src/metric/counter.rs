use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonically non-decreasing integer.
///
/// Monotonicity is a caller contract: `add` only accepts unsigned deltas, and
/// there is no way to decrement.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by 1.
    pub fn inc(&self) {
        self.add(1);
    }

    /// Increment by an arbitrary value. Wraps on overflow.
    pub fn add(&self, v: u64) {
        self.value.fetch_add(v, Ordering::Relaxed);
    }

    pub fn read(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}
