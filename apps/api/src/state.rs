use std::sync::Arc;

use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::scoring::fit::FitScorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the skill library loaded at startup.
    pub scorer: Arc<FitScorer>,
    /// Lazily resolved embedding model, shared by every request.
    pub embeddings: Arc<EmbeddingProvider>,
}
