//! Text embeddings for semantic similarity.
//!
//! The embedding model is expensive to load, so it is resolved lazily by
//! `EmbeddingProvider` and memoized for the process lifetime:
//! 1. read the model files from the local model directory;
//! 2. on any failure, download them from the model hub by identifier and cache them
//!    in the local directory for the next start.
//!
//! `AppState` holds an `Arc<EmbeddingProvider>`; scoring code only sees `&dyn Embedder`.

pub mod hub;
pub mod loader;
pub mod model_files;
pub mod onnx;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::embedding::loader::ModelLoader;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding model unavailable (local: {local}; remote: {remote})")]
    ModelUnavailable { local: String, remote: String },

    #[error("Failed to load embedding model: {0}")]
    Load(String),

    #[error("Model download failed: {0}")]
    Download(String),

    #[error("Failed to cache embedding model: {0}")]
    Cache(String),

    #[error("Embedding inference failed: {0}")]
    Inference(String),

    #[error("Embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// A sentence embedding backend. Implementations are synchronous and compute-bound;
/// callers run them off the async executor.
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embeds a single text.
    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Inference("model returned no embedding".to_string()))
    }
}

/// Cosine similarity in [-1, 1]. Zero vectors have similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, EmbeddingError> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}

/// Where the embedding model comes from.
#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub local_path: PathBuf,
    pub model_id: String,
    /// ONNX graph path relative to the model root.
    pub onnx_file: String,
}

/// Lazily resolves and memoizes the embedding model.
///
/// The first caller loads the model while concurrent callers wait on the same
/// initialization; afterwards the cached instance is returned without locking.
/// A failed load leaves the cell empty so a later call can try again.
pub struct EmbeddingProvider {
    loader: Box<dyn ModelLoader>,
    model: OnceCell<Arc<dyn Embedder>>,
}

impl EmbeddingProvider {
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            model: OnceCell::new(),
        }
    }

    /// A provider that is already resolved to `embedder`.
    #[cfg(test)]
    pub fn preloaded(loader: impl ModelLoader + 'static, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            loader: Box::new(loader),
            model: OnceCell::new_with(Some(embedder)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    pub async fn get(&self) -> Result<Arc<dyn Embedder>, EmbeddingError> {
        self.model
            .get_or_try_init(|| self.resolve())
            .await
            .cloned()
    }

    async fn resolve(&self) -> Result<Arc<dyn Embedder>, EmbeddingError> {
        let local = match self.loader.load_local().await {
            Ok(embedder) => {
                info!(
                    path = %self.loader.local_source(),
                    "Embedding model loaded from local cache"
                );
                return Ok(embedder);
            }
            Err(e) => e,
        };

        warn!(
            path = %self.loader.local_source(),
            error = %local,
            hub = %self.loader.remote_source(),
            "Local embedding model unavailable, falling back to hub download"
        );

        match self.loader.load_remote().await {
            Ok(embedder) => {
                info!(model = %embedder.name(), "Embedding model loaded from hub");
                Ok(embedder)
            }
            Err(remote) => Err(EmbeddingError::ModelUnavailable {
                local: local.to_string(),
                remote: remote.to_string(),
            }),
        }
    }
}
