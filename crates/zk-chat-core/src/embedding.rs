//! Embedding provider trait and vector utilities.
//!
//! Defines the [`EmbeddingProvider`] trait that all embedding backends
//! implement, plus pure helper functions for vector serialization and
//! distance computation.
//!
//! Concrete providers (Ollama, OpenAI) live in the `zk-chat` app crate.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for embedding providers.
///
/// Implementations are created once per process and shared across every
/// indexing and query operation.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"nomic-embed-text"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `768`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts. Returns one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Bytes per stored vector component.
const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Pack an embedding for the `vectors.embedding` column: components as
/// little-endian `f32`, back to back.
///
/// ```rust
/// use zk_chat_core::embedding::{blob_to_vec, vec_to_blob};
///
/// let embedding = vec![0.25f32, -1.0, 8.0];
/// let blob = vec_to_blob(&embedding);
/// assert_eq!(blob.len(), 12);
/// assert_eq!(blob_to_vec(&blob), embedding);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|component| component.to_le_bytes()).collect()
}

/// Unpack an embedding stored by [`vec_to_blob`]. Trailing bytes that do
/// not fill a whole component are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(F32_BYTES)
        .filter_map(|bytes| bytes.try_into().ok().map(f32::from_le_bytes))
        .collect()
}

/// Cosine of the angle between a query embedding and a stored one.
///
/// Mismatched dimensions (a vault re-embedded with another model) and
/// zero vectors score `0.0`, so they rank as unrelated instead of failing
/// the query.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (dot, a_sq, b_sq) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, a_sq, b_sq), (x, y)| {
            (dot + x * y, a_sq + x * x, b_sq + y * y)
        });

    let norms = (a_sq * b_sq).sqrt();
    if norms < f32::EPSILON {
        0.0
    } else {
        dot / norms
    }
}

/// Distance used to rank hits in every
/// [`VectorStore`](crate::store::VectorStore): `1 - cosine_similarity`,
/// from `0.0` (same direction) to `2.0` (opposite).
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}
