//! Local embeddings through fastembed, for running without an embedding API.

use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::error::{RcaBotError, Result};
use crate::ports::EmbeddingGenerator;

const MODEL_NAME: &str = "BAAI/bge-small-en-v1.5";
const DIMENSION: usize = 384;

pub struct FastEmbedGenerator {
    model: Arc<TextEmbedding>,
}

impl FastEmbedGenerator {
    pub fn new() -> Result<Self> {
        let options =
            InitOptions::new(EmbeddingModel::BGESmallENV15).with_show_download_progress(false);
        let model = TextEmbedding::try_new(options)
            .map_err(|e| RcaBotError::Generation(format!("failed to load {MODEL_NAME}: {e}")))?;

        Ok(Self {
            model: Arc::new(model),
        })
    }
}

#[async_trait]
impl EmbeddingGenerator for FastEmbedGenerator {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .pop()
            .ok_or_else(|| RcaBotError::Generation("no embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let owned: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();
        let model = Arc::clone(&self.model);

        tokio::task::spawn_blocking(move || model.embed(owned, None))
            .await
            .map_err(|e| RcaBotError::Generation(format!("embedding task failed: {e}")))?
            .map_err(|e| RcaBotError::Generation(e.to_string()))
    }

    fn dimension(&self) -> Option<usize> {
        Some(DIMENSION)
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}
