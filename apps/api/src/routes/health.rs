use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version and whether the embedding
/// model has been resolved yet.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let embedding_model = if state.embeddings.is_loaded() {
        "loaded"
    } else {
        "not_loaded"
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "fitscore-api",
        "embedding_model": embedding_model
    }))
}
