/// Shared application state for the webserver.
use std::sync::Arc;

use crate::enrichment::Enricher;
use crate::monitor::TokenMonitor;

/// Passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<TokenMonitor>,
    pub enricher: Arc<Enricher>,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(monitor: Arc<TokenMonitor>, enricher: Arc<Enricher>) -> Self {
        Self {
            monitor,
            enricher,
            startup_time: chrono::Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        (chrono::Utc::now() - self.startup_time).num_seconds().max(0) as u64
    }
}
