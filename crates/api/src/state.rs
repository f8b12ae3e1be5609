//! Application state shared across handlers.

use clickhouse_client::ActivityStore;
use redpanda::EventProducer;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Event producer (Redpanda in production, mock in tests)
    pub producer: Arc<dyn EventProducer>,
    /// Activity store (ClickHouse in production, mock in tests)
    pub store: Arc<dyn ActivityStore>,
}

impl AppState {
    pub fn new(producer: Arc<dyn EventProducer>, store: Arc<dyn ActivityStore>) -> Self {
        Self { producer, store }
    }
}
