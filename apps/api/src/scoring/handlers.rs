//! Axum route handlers for the Fit Scoring API.

use std::time::Duration;

use anyhow::anyhow;
use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::scoring::fit::{BatchResults, FitScoreResult};
use crate::scoring::skill_library::SkillLibrary;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FitScoreRequest {
    pub resume_text: String,
    pub jd_text: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchFitScoreRequest {
    pub resumes: Vec<String>,
    pub jd_text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/fit-score
///
/// Scores one resume against one job description. Empty texts are scored, not rejected.
pub async fn handle_fit_score(
    State(state): State<AppState>,
    Json(request): Json<FitScoreRequest>,
) -> Result<Json<FitScoreResult>, AppError> {
    let embedder = state.embeddings.get().await?;
    let scorer = state.scorer.clone();

    let result = run_blocking(state.config.inference_timeout, move || {
        scorer.score_job_fit(&request.resume_text, &request.jd_text, embedder.as_ref())
    })
    .await??;

    Ok(Json(result))
}

/// POST /api/v1/fit-score/batch
///
/// Scores every resume against one JD. Keys are `resume_1..resume_n` in input order;
/// a resume that fails to score gets an error entry instead of failing the request.
pub async fn handle_fit_score_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchFitScoreRequest>,
) -> Result<Json<BatchResults>, AppError> {
    let embedder = state.embeddings.get().await?;
    let scorer = state.scorer.clone();

    let items = u32::try_from(request.resumes.len().max(1)).unwrap_or(u32::MAX);
    let budget = state.config.inference_timeout.saturating_mul(items);

    let results = run_blocking(budget, move || {
        scorer.process_batch(&request.resumes, &request.jd_text, embedder.as_ref())
    })
    .await?;

    info!(
        scored = results.len() - results.failed_count(),
        failed = results.failed_count(),
        "Resume batch scored"
    );
    Ok(Json(results))
}

/// GET /api/v1/skills
///
/// Returns the category → synonyms mapping currently in memory.
pub async fn handle_get_skills(State(state): State<AppState>) -> Json<SkillLibrary> {
    Json(state.scorer.library().clone())
}

/// Runs compute-bound scoring on the blocking pool, bounded by `budget`.
/// On timeout the blocking task keeps running to completion; only the response is abandoned.
async fn run_blocking<T, F>(budget: Duration, work: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(budget, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_error)) => Err(AppError::Internal(anyhow!(
            "scoring task failed: {join_error}"
        ))),
        Err(_) => Err(AppError::Timeout(budget.as_secs())),
    }
}
