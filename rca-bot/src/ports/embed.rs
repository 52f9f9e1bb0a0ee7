use async_trait::async_trait;

use crate::error::Result;

/// Turns text into fixed-length vectors. Every vector returned by one
/// generator has `dimension()` entries.
#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;
    fn dimension(&self) -> Option<usize>;
    fn model_name(&self) -> &str;
}
