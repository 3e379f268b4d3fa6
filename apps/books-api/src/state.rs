//! Application state management

use std::sync::Arc;

use crate::books::{BookStore, Catalog};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    catalog: Catalog,
}

impl AppState {
    /// Create application state over the given collection store
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                catalog: Catalog::new(store),
            }),
        }
    }

    /// Get the book catalog
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }
}
