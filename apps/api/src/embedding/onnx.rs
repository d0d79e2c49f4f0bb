//! In-process sentence embeddings via fastembed's user-defined ONNX models.

use fastembed::{
    InitOptionsUserDefined, Pooling, TextEmbedding, TokenizerFiles, UserDefinedEmbeddingModel,
};
use tracing::debug;

use crate::embedding::model_files::ModelFiles;
use crate::embedding::{Embedder, EmbeddingError};

/// e5-base-v2 was trained with 512-token inputs.
const MAX_INPUT_TOKENS: usize = 512;

/// `TextEmbedding::embed` takes `&self`, so concurrent requests run inference in parallel.
pub struct OnnxEmbedder {
    name: String,
    model: TextEmbedding,
}

impl OnnxEmbedder {
    /// Builds an ONNX session from raw model bytes. Mean pooling, as the e5 family expects.
    pub fn from_files(name: impl Into<String>, files: ModelFiles) -> Result<Self, EmbeddingError> {
        let tokenizer_files = TokenizerFiles {
            tokenizer_file: files.tokenizer,
            config_file: files.config,
            special_tokens_map_file: files.special_tokens_map,
            tokenizer_config_file: files.tokenizer_config,
        };
        let definition =
            UserDefinedEmbeddingModel::new(files.onnx, tokenizer_files).with_pooling(Pooling::Mean);
        let options = InitOptionsUserDefined::default().with_max_length(MAX_INPUT_TOKENS);

        let model = TextEmbedding::try_new_from_user_defined(definition, options)
            .map_err(|e| EmbeddingError::Load(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            model,
        })
    }
}

impl Embedder for OnnxEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let embeddings = self
            .model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;

        debug!(model = %self.name, inputs = texts.len(), "Computed embeddings");
        Ok(embeddings)
    }
}
