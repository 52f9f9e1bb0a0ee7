use serde::{Deserialize, Serialize};

/// A bounded slice of a fetched document, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub source_url: String,
    pub content: String,
    /// Zero-based index of the chunk within its document.
    pub position: usize,
}

impl TextChunk {
    pub fn new(source_url: impl Into<String>, content: impl Into<String>, position: usize) -> Self {
        Self {
            source_url: source_url.into(),
            content: content.into(),
            position,
        }
    }

    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
