use std::path::Path;

use crate::embedding::EmbeddingError;

/// Tokenizer and config files that sit next to the ONNX graph, in `ModelFiles` field order.
pub const MODEL_SIDECAR_FILES: [&str; 4] = [
    "tokenizer.json",
    "config.json",
    "special_tokens_map.json",
    "tokenizer_config.json",
];

/// Raw bytes of a sentence-embedding model, however they were obtained.
pub struct ModelFiles {
    pub onnx: Vec<u8>,
    pub tokenizer: Vec<u8>,
    pub config: Vec<u8>,
    pub special_tokens_map: Vec<u8>,
    pub tokenizer_config: Vec<u8>,
}

impl ModelFiles {
    /// Reads a locally cached model laid out like the hub repository.
    pub fn read_from_dir(dir: &Path, onnx_file: &str) -> Result<Self, EmbeddingError> {
        let read = |file: &str| {
            let path = dir.join(file);
            std::fs::read(&path)
                .map_err(|e| EmbeddingError::Load(format!("{}: {e}", path.display())))
        };
        let [tokenizer, config, special_tokens_map, tokenizer_config] = MODEL_SIDECAR_FILES;

        Ok(Self {
            onnx: read(onnx_file)?,
            tokenizer: read(tokenizer)?,
            config: read(config)?,
            special_tokens_map: read(special_tokens_map)?,
            tokenizer_config: read(tokenizer_config)?,
        })
    }

    /// Writes the files into `dir` with the same layout `read_from_dir` expects.
    ///
    /// Each file goes to a `.part` sibling first and is renamed into place. The ONNX graph
    /// is written last, so an interrupted write never leaves a directory that reads back.
    pub fn write_to_dir(&self, dir: &Path, onnx_file: &str) -> Result<(), EmbeddingError> {
        let write = |file: &str, bytes: &[u8]| -> Result<(), EmbeddingError> {
            let path = dir.join(file);
            let cache_error = |e: std::io::Error| {
                EmbeddingError::Cache(format!("{}: {e}", path.display()))
            };
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(cache_error)?;
            }
            let partial = dir.join(format!("{file}.part"));
            std::fs::write(&partial, bytes).map_err(cache_error)?;
            std::fs::rename(&partial, &path).map_err(cache_error)
        };
        let [tokenizer, config, special_tokens_map, tokenizer_config] = MODEL_SIDECAR_FILES;

        write(tokenizer, &self.tokenizer)?;
        write(config, &self.config)?;
        write(special_tokens_map, &self.special_tokens_map)?;
        write(tokenizer_config, &self.tokenizer_config)?;
        write(onnx_file, &self.onnx)
    }
}

impl std::fmt::Debug for ModelFiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelFiles")
            .field("onnx_bytes", &self.onnx.len())
            .field("tokenizer_bytes", &self.tokenizer.len())
            .finish_non_exhaustive()
    }
}
