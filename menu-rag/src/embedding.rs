//! Embedding provider trait for turning query text into vectors.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// The catalog embeddings are precomputed offline, so the provider used at
/// query time must be the same model (and dimensionality) that produced
/// them. Output must be deterministic for a fixed model version.
/// Failures should be reported as
/// [`RagError::EmbeddingError`](crate::RagError::EmbeddingError); any other
/// error is rewrapped as one by the retrieval engine.
///
/// # Example
///
/// ```rust,ignore
/// use menu_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("high protein dinner").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Provider name used in logs and errors.
    fn name(&self) -> &str;
}
