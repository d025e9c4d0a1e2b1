//! Application state for the API
//!
//! Holds shared state across all API handlers.

use crate::config::RegistryConfig;
use crate::service::Registry;
use crate::store::InMemoryRecordStore;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Allocation registry
    pub registry: Registry,
}

impl AppState {
    /// Create state around a configured registry
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Create state backed by a fresh in-memory store and default settings
    pub fn in_memory() -> Self {
        let config = RegistryConfig::default();
        let store = Arc::new(InMemoryRecordStore::new());
        let registry = Registry::with_pool(
            store,
            crate::allocator::AllocationPool::default(),
            config.operation_timeout(),
        );
        Self { registry }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory()
    }
}
