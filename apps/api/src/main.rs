mod config;
mod embedding;
mod errors;
mod routes;
mod scoring;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::embedding::hub::HubClient;
use crate::embedding::loader::HubModelLoader;
use crate::embedding::EmbeddingProvider;
use crate::routes::build_router;
use crate::scoring::fit::FitScorer;
use crate::scoring::skill_library::SkillLibrary;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Fit Scoring API v{}", env!("CARGO_PKG_VERSION"));

    // Skill library: loaded once, shared read-only. A malformed file stops startup.
    let library = SkillLibrary::load(&config.skills_path)
        .context("Invalid skill library configuration")?;
    let scorer = Arc::new(FitScorer::new(Arc::new(library)));

    // Embedding model: resolved on first use unless preloading is requested
    let hub =
        HubClient::new(config.model_hub_url.clone())?.with_max_retries(config.model_hub_max_retries);
    let loader = HubModelLoader::new(config.embedding_settings(), hub);
    let embeddings = Arc::new(EmbeddingProvider::new(loader));
    if config.preload_embedding_model {
        match embeddings.get().await {
            Ok(model) => info!("Embedding model ready: {}", model.name()),
            Err(e) => warn!("Embedding model preload failed, will retry on first request: {e}"),
        }
    }

    // Build app state
    let state = AppState {
        config: config.clone(),
        scorer,
        embeddings,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
