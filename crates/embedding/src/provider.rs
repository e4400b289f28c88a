use async_trait::async_trait;
use vecsearch_common::Result;

/// Converts text into a fixed-length embedding vector
///
/// Implementations fail with `EmbeddingUnavailable` when the backend errors
/// or times out and with `EmbeddingMalformed` when its reply is unusable.
/// Output must not be cached: the same text may embed differently across
/// provider versions.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
