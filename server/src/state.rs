//! Shared handler state.

use std::sync::Arc;

use countrycache_engine::{QueryEngine, RefreshOrchestrator};

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RefreshOrchestrator>,
    pub query: QueryEngine,
}

impl AppState {
    /// Build handler state around an orchestrator; queries read the same store.
    pub fn new(orchestrator: Arc<RefreshOrchestrator>) -> Self {
        let query = QueryEngine::new(orchestrator.store().clone());
        Self { orchestrator, query }
    }
}
