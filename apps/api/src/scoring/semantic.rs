use crate::embedding::{cosine_similarity, Embedder, EmbeddingError};

/// 100 × cosine similarity of the two texts' embeddings. Not clamped: ranges over [-100, 100].
pub fn semantic_similarity(
    embedder: &dyn Embedder,
    text_a: &str,
    text_b: &str,
) -> Result<f64, EmbeddingError> {
    let a = embedder.embed_one(text_a)?;
    let b = embedder.embed_one(text_b)?;
    Ok(cosine_similarity(&a, &b)? * 100.0)
}
