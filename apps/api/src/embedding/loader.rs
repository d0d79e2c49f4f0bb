//! Where an embedding model comes from.
//!
//! `ModelLoader` is the two-tier seam behind `EmbeddingProvider`: a local model directory
//! first, the model hub second. `HubModelLoader` is the production implementation; a
//! successful hub download is written back into the local directory so the next process
//! starts from the local tier.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::embedding::hub::HubClient;
use crate::embedding::model_files::ModelFiles;
use crate::embedding::onnx::OnnxEmbedder;
use crate::embedding::{Embedder, EmbeddingError, EmbeddingSettings};

#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Human-readable location of each tier, for logs and error messages.
    fn local_source(&self) -> String;
    fn remote_source(&self) -> String;

    async fn load_local(&self) -> Result<Arc<dyn Embedder>, EmbeddingError>;
    async fn load_remote(&self) -> Result<Arc<dyn Embedder>, EmbeddingError>;
}

/// Turns raw model files into a ready embedder. Runs on the blocking pool.
pub type BuildEmbedder = fn(String, ModelFiles) -> Result<Arc<dyn Embedder>, EmbeddingError>;

fn build_onnx(name: String, files: ModelFiles) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    Ok(Arc::new(OnnxEmbedder::from_files(name, files)?))
}

pub struct HubModelLoader {
    settings: EmbeddingSettings,
    hub: HubClient,
    build: BuildEmbedder,
}

impl HubModelLoader {
    pub fn new(settings: EmbeddingSettings, hub: HubClient) -> Self {
        Self {
            settings,
            hub,
            build: build_onnx,
        }
    }

    #[cfg(test)]
    pub fn with_builder(mut self, build: BuildEmbedder) -> Self {
        self.build = build;
        self
    }
}

#[async_trait]
impl ModelLoader for HubModelLoader {
    fn local_source(&self) -> String {
        self.settings.local_path.display().to_string()
    }

    fn remote_source(&self) -> String {
        self.hub.file_url(&self.settings.model_id, "")
    }

    async fn load_local(&self) -> Result<Arc<dyn Embedder>, EmbeddingError> {
        let settings = self.settings.clone();
        let build = self.build;
        tokio::task::spawn_blocking(move || {
            let files = ModelFiles::read_from_dir(&settings.local_path, &settings.onnx_file)?;
            build(settings.local_path.display().to_string(), files)
        })
        .await
        .map_err(|e| EmbeddingError::Load(format!("model load task failed: {e}")))?
    }

    async fn load_remote(&self) -> Result<Arc<dyn Embedder>, EmbeddingError> {
        let files = self
            .hub
            .fetch_model(&self.settings.model_id, &self.settings.onnx_file)
            .await?;
        let settings = self.settings.clone();
        let build = self.build;
        tokio::task::spawn_blocking(move || {
            // Best effort: a read-only or full disk only costs the next process a download.
            match files.write_to_dir(&settings.local_path, &settings.onnx_file) {
                Ok(()) => info!(
                    path = %settings.local_path.display(),
                    "Embedding model cached locally"
                ),
                Err(e) => warn!(error = %e, "Could not cache embedding model locally"),
            }
            build(settings.model_id, files)
        })
        .await
        .map_err(|e| EmbeddingError::Load(format!("model load task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    use super::*;
    use crate::embedding::model_files::MODEL_SIDECAR_FILES;
    use crate::embedding::testing::{unreachable_hub, unreachable_settings};
    use crate::embedding::EmbeddingProvider;

    /// Names the embedder after the tokenizer bytes so tests can tell where files came from.
    fn build_named(_name: String, files: ModelFiles) -> Result<Arc<dyn Embedder>, EmbeddingError> {
        struct Named(String);
        impl Embedder for Named {
            fn name(&self) -> &str {
                &self.0
            }
            fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
                Ok(texts.iter().map(|_| vec![1.0]).collect())
            }
        }
        let name = String::from_utf8_lossy(&files.tokenizer).into_owned();
        Ok(Arc::new(Named(name)))
    }

    /// Serves `/{org}/{model}/resolve/main/{*file}` with the file name as its contents.
    async fn spawn_hub() -> String {
        async fn serve_file(
            Path((_org, _model, file)): Path<(String, String, String)>,
        ) -> Result<String, StatusCode> {
            let known = file == "onnx/model.onnx" || MODEL_SIDECAR_FILES.contains(&file.as_str());
            if known {
                Ok(format!("hub:{file}"))
            } else {
                Err(StatusCode::NOT_FOUND)
            }
        }

        let app = Router::new().route("/:org/:model/resolve/main/*file", get(serve_file));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_remote_load_populates_local_tier() {
        let dir = tempfile::tempdir().unwrap();
        let settings = unreachable_settings(dir.path());
        let hub = HubClient::new(spawn_hub().await).unwrap().with_max_retries(1);

        let first = EmbeddingProvider::new(
            HubModelLoader::new(settings.clone(), hub).with_builder(build_named),
        );
        assert_eq!(first.get().await.unwrap().name(), "hub:tokenizer.json");
        assert!(settings.local_path.join("onnx/model.onnx").exists());

        // Same directory, no reachable hub: only the local tier can satisfy this.
        let loader =
            HubModelLoader::new(settings.clone(), unreachable_hub()).with_builder(build_named);
        let local = loader.load_local().await.unwrap();
        assert_eq!(local.name(), "hub:tokenizer.json");

        let second = EmbeddingProvider::new(loader);
        assert_eq!(second.get().await.unwrap().name(), "hub:tokenizer.json");
    }

    #[tokio::test]
    async fn test_failed_cache_write_still_loads_remote_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = unreachable_settings(dir.path());
        settings.local_path = dir.path().join("occupied");
        std::fs::write(&settings.local_path, b"a file, not a directory").unwrap();
        let hub = HubClient::new(spawn_hub().await).unwrap().with_max_retries(1);

        let loader = HubModelLoader::new(settings, hub).with_builder(build_named);
        let embedder = loader.load_remote().await.unwrap();
        assert_eq!(embedder.name(), "hub:tokenizer.json");
    }

    #[tokio::test]
    async fn test_missing_local_dir_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = HubModelLoader::new(unreachable_settings(dir.path()), unreachable_hub())
            .with_builder(build_named);
        let err = match loader.load_local().await {
            Ok(_) => panic!("nothing is cached yet"),
            Err(e) => e,
        };
        assert!(matches!(err, EmbeddingError::Load(_)));
    }
}
