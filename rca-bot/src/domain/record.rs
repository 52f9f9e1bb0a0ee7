use serde::{Deserialize, Serialize};

use super::TextChunk;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub chunk: TextChunk,
    pub vector: Vec<f32>,
}

impl EmbeddingRecord {
    pub const fn new(chunk: TextChunk, vector: Vec<f32>) -> Self {
        Self { chunk, vector }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}
