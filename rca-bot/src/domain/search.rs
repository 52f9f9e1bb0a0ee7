use serde::{Deserialize, Serialize};

use super::TextChunk;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: TextChunk,
    pub score: f32,
}

/// Result of one retrieval: the query actually searched and the ranked chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retrieval {
    pub query: String,
    pub chunks: Vec<ScoredChunk>,
}

impl Retrieval {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
