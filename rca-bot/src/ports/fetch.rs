use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetches `url` and returns its extracted plain text.
    async fn fetch(&self, url: &str) -> Result<FetchedDocument>;
}

#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub url: String,
    pub title: Option<String>,
    pub content_type: Option<String>,
    pub text: String,
}
