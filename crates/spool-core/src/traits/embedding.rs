use crate::errors::SpoolResult;

/// Embedding-vector provider.
///
/// Returns fixed-dimension float vectors and carries no caching
/// responsibility; caching is the engine's job.
pub trait IEmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input.
    fn encode_batch(&self, texts: &[String]) -> SpoolResult<Vec<Vec<f32>>>;

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Human-readable provider name.
    fn name(&self) -> &str;
}
