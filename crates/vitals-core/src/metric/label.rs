use std::sync::{Arc, RwLock};

use super::relock;

/// UTF-8 string metric, replaced as a whole.
#[derive(Debug, Clone, Default)]
pub struct Label {
    value: Arc<RwLock<String>>,
}

impl Label {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, v: impl Into<String>) {
        *relock(self.value.write()) = v.into();
    }

    /// Replace the value with `f(current)` under the write lock.
    pub fn modify<F>(&self, f: F)
    where
        F: FnOnce(&str) -> String,
    {
        let mut guard = relock(self.value.write());
        *guard = f(&guard);
    }

    pub fn read(&self) -> String {
        relock(self.value.read()).clone()
    }
}
