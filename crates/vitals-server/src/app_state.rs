//! Shared state handed to every HTTP handler.

use vitals_core::Store;

#[derive(Clone, Debug)]
pub struct AppState {
    store: Store,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}
