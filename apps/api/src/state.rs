use std::sync::Arc;

use crate::config::Config;
use crate::interview::orchestrator::SessionOrchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the session store and every provider client.
    pub orchestrator: Arc<SessionOrchestrator>,
    pub config: Config,
}
