//! Concrete implementations of the port traits.

#[cfg(feature = "fastembed")]
pub mod local;
pub mod openai;
pub mod web;

use std::sync::Arc;

use crate::config::{Config, EmbeddingBackend};
use crate::error::Result;
use crate::ports::EmbeddingGenerator;

pub use openai::{OpenAiChat, OpenAiEmbedder};
pub use web::WebFetcher;

/// Builds the embedding backend named in the configuration.
pub fn embedder_from_config(config: &Config) -> Result<Arc<dyn EmbeddingGenerator>> {
    match config.embedding.backend {
        EmbeddingBackend::OpenAi => Ok(Arc::new(OpenAiEmbedder::from_config(config)?)),
        #[cfg(feature = "fastembed")]
        EmbeddingBackend::FastEmbed => Ok(Arc::new(local::FastEmbedGenerator::new()?)),
        #[cfg(not(feature = "fastembed"))]
        EmbeddingBackend::FastEmbed => Err(crate::error::RcaBotError::Config(
            "embedding.backend = \"fastembed\" requires building with --features fastembed"
                .to_string(),
        )),
    }
}
