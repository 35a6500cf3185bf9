use std::sync::Arc;

use crate::scoring::ScoringService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub scoring: Arc<ScoringService>,
}
