//! Shared state for API handlers.

use haraj_scraper::ScrapeOrchestrator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ScrapeOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: ScrapeOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}
