//! Model Hub Client: downloads pretrained model files by model identifier.
//!
//! Files are fetched from `{base_url}/{model_id}/resolve/main/{file}` into memory.
//! Caching them on disk is the loader's job.
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::embedding::model_files::{ModelFiles, MODEL_SIDECAR_FILES};
use crate::embedding::EmbeddingError;

pub const DEFAULT_HUB_URL: &str = "https://huggingface.co";
pub const MAX_RETRIES: u32 = 3;

#[derive(Clone)]
pub struct HubClient {
    client: Client,
    base_url: String,
    max_retries: u32,
}

impl HubClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(600))
            .build()
            .map_err(|e| EmbeddingError::Download(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: MAX_RETRIES,
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn file_url(&self, model_id: &str, file: &str) -> String {
        format!("{}/{model_id}/resolve/main/{file}", self.base_url)
    }

    /// Downloads the ONNX graph plus the tokenizer sidecar files of `model_id`.
    pub async fn fetch_model(
        &self,
        model_id: &str,
        onnx_file: &str,
    ) -> Result<ModelFiles, EmbeddingError> {
        info!(model_id, "Fetching embedding model from hub");

        let onnx = self.fetch_file(model_id, onnx_file).await?;
        let [tokenizer, config, special_tokens_map, tokenizer_config] = MODEL_SIDECAR_FILES;

        Ok(ModelFiles {
            onnx,
            tokenizer: self.fetch_file(model_id, tokenizer).await?,
            config: self.fetch_file(model_id, config).await?,
            special_tokens_map: self.fetch_file(model_id, special_tokens_map).await?,
            tokenizer_config: self.fetch_file(model_id, tokenizer_config).await?,
        })
    }

    /// Fetches one file. Retries on transport errors, 429 and 5xx with exponential backoff.
    pub async fn fetch_file(&self, model_id: &str, file: &str) -> Result<Vec<u8>, EmbeddingError> {
        let url = self.file_url(model_id, file);
        let mut last_error: Option<EmbeddingError> = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Download of {} attempt {} failed, retrying after {}ms...",
                    file,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.get(&url).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(EmbeddingError::Download(format!("{url}: {e}")));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                warn!("Model hub returned {} for {}", status, url);
                last_error = Some(EmbeddingError::Download(format!("{url}: HTTP {status}")));
                continue;
            }

            if !status.is_success() {
                return Err(EmbeddingError::Download(format!("{url}: HTTP {status}")));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| EmbeddingError::Download(format!("{url}: {e}")))?;

            debug!(file, bytes = bytes.len(), "Model file downloaded");
            return Ok(bytes.to_vec());
        }

        Err(last_error.unwrap_or_else(|| {
            EmbeddingError::Download(format!("{url}: gave up after {} attempts", self.max_retries))
        }))
    }
}
