use std::path::Path;
use std::sync::Arc;

use crate::domain::{EmbeddingRecord, IndexManifest, KnowledgeBaseHandle, TextChunk};
use crate::error::{RcaBotError, Result};
use crate::ports::EmbeddingGenerator;
use crate::store;

pub const DEFAULT_BATCH_SIZE: usize = 64;

pub struct Indexer<E>
where
    E: EmbeddingGenerator + ?Sized,
{
    embedder: Arc<E>,
    batch_size: usize,
}

impl<E> Indexer<E>
where
    E: EmbeddingGenerator + ?Sized,
{
    pub const fn new(embedder: Arc<E>) -> Self {
        Self {
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Embeds every chunk and replaces the index at `destination`.
    pub async fn build(
        &self,
        chunks: Vec<TextChunk>,
        destination: &Path,
    ) -> Result<KnowledgeBaseHandle> {
        if chunks.is_empty() {
            return Err(RcaBotError::EmptyDocument(format!(
                "nothing to index into {}",
                destination.display()
            )));
        }

        let vectors = self.embed_all(&chunks).await?;
        let records: Vec<EmbeddingRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddingRecord::new(chunk, vector))
            .collect();

        let manifest = IndexManifest::describe(&records, self.embedder.model_name());
        store::write(destination, &manifest, &records).await?;

        tracing::info!(
            id = %manifest.id,
            records = manifest.record_count,
            dimension = manifest.dimension,
            "Built knowledge base at {}",
            destination.display()
        );
        Ok(KnowledgeBaseHandle::new(
            destination.to_path_buf(),
            manifest,
            records,
        ))
    }

    /// Binds to the index previously built at `destination`.
    pub async fn open(&self, destination: &Path) -> Result<KnowledgeBaseHandle> {
        let (manifest, records) = store::read(destination).await?;

        if let Some(dimension) = self.embedder.dimension()
            && dimension != manifest.dimension
        {
            return Err(RcaBotError::Config(format!(
                "knowledge base at {} holds {}-dimensional vectors from {}, but {} produces {dimension}; process the URL again",
                destination.display(),
                manifest.dimension,
                manifest.embedding_model,
                self.embedder.model_name()
            )));
        }

        if manifest.embedding_model != self.embedder.model_name() {
            tracing::warn!(
                "Knowledge base at {} was embedded with {}, queries use {}",
                destination.display(),
                manifest.embedding_model,
                self.embedder.model_name()
            );
        }

        tracing::info!(
            id = %manifest.id,
            records = manifest.record_count,
            "Opened knowledge base at {}",
            destination.display()
        );
        Ok(KnowledgeBaseHandle::new(
            destination.to_path_buf(),
            manifest,
            records,
        ))
    }

    async fn embed_all(&self, chunks: &[TextChunk]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();
            let embedded = self.embedder.embed_batch(&texts).await?;
            if embedded.len() != texts.len() {
                return Err(RcaBotError::Generation(format!(
                    "{} returned {} vectors for {} chunks",
                    self.embedder.model_name(),
                    embedded.len(),
                    texts.len()
                )));
            }
            tracing::debug!("Embedded {}/{} chunks", vectors.len() + embedded.len(), chunks.len());
            vectors.extend(embedded);
        }

        let dimension = vectors.first().map_or(0, Vec::len);
        if dimension == 0 || vectors.iter().any(|v| v.len() != dimension) {
            return Err(RcaBotError::Generation(format!(
                "{} returned vectors of inconsistent dimension",
                self.embedder.model_name()
            )));
        }
        if let Some(expected) = self.embedder.dimension()
            && expected != dimension
        {
            return Err(RcaBotError::Generation(format!(
                "{} returned {dimension}-dimensional vectors, expected {expected}",
                self.embedder.model_name()
            )));
        }

        Ok(vectors)
    }
}
