use std::sync::Arc;

use url::Url;

use crate::domain::TextChunk;
use crate::error::{RcaBotError, Result};
use crate::ports::DocumentFetcher;
use crate::services::splitter::RecursiveSplitter;

pub struct DocumentIngestor<F>
where
    F: DocumentFetcher + ?Sized,
{
    fetcher: Arc<F>,
    splitter: RecursiveSplitter,
}

impl<F> DocumentIngestor<F>
where
    F: DocumentFetcher + ?Sized,
{
    pub const fn new(fetcher: Arc<F>, splitter: RecursiveSplitter) -> Self {
        Self { fetcher, splitter }
    }

    /// Fetches `url` and splits its text into ordered chunks.
    pub async fn ingest(&self, url: &str) -> Result<Vec<TextChunk>> {
        let url = validate_url(url)?;
        let document = self.fetcher.fetch(url.as_str()).await?;

        if document.text.trim().is_empty() {
            return Err(RcaBotError::EmptyDocument(url.to_string()));
        }

        let chunks: Vec<TextChunk> = self
            .splitter
            .split(&document.text)
            .into_iter()
            .enumerate()
            .map(|(position, content)| TextChunk::new(url.as_str(), content, position))
            .collect();

        if chunks.is_empty() {
            return Err(RcaBotError::EmptyDocument(url.to_string()));
        }

        tracing::info!(
            url = %url,
            title = document.title.as_deref().unwrap_or_default(),
            chars = document.text.chars().count(),
            chunks = chunks.len(),
            "Ingested document"
        );
        Ok(chunks)
    }
}

/// Accepts only absolute `http`/`https` URLs.
pub fn validate_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RcaBotError::Fetch("no URL given".to_string()));
    }

    let url = Url::parse(trimmed).map_err(|e| RcaBotError::Fetch(format!("{trimmed}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(RcaBotError::Fetch(format!(
            "{trimmed}: unsupported scheme '{scheme}'"
        ))),
    }
}
