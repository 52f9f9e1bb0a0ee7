use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EmbeddingRecord, IndexId};

pub const MANIFEST_FORMAT_VERSION: u32 = 1;

/// Metadata persisted next to the records of a knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub id: IndexId,
    pub format_version: u32,
    pub source_url: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub record_count: usize,
    /// blake3 over the chunk contents, in order.
    pub content_hash: String,
    pub built_at: DateTime<Utc>,
}

impl IndexManifest {
    pub fn describe(records: &[EmbeddingRecord], embedding_model: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        for record in records {
            hasher.update(record.chunk.content.as_bytes());
        }

        Self {
            id: IndexId::generate(),
            format_version: MANIFEST_FORMAT_VERSION,
            source_url: records
                .first()
                .map(|r| r.chunk.source_url.clone())
                .unwrap_or_default(),
            embedding_model: embedding_model.to_string(),
            dimension: records.first().map_or(0, EmbeddingRecord::dimension),
            record_count: records.len(),
            content_hash: hasher.finalize().to_hex().to_string(),
            built_at: Utc::now(),
        }
    }
}

/// A persisted knowledge base bound to its on-disk location.
///
/// Records are shared, so cloning a handle is cheap. A handle stays valid
/// until a new build replaces it; nothing here watches the directory.
#[derive(Debug, Clone)]
pub struct KnowledgeBaseHandle {
    location: PathBuf,
    manifest: IndexManifest,
    records: Arc<[EmbeddingRecord]>,
}

impl KnowledgeBaseHandle {
    pub fn new(location: PathBuf, manifest: IndexManifest, records: Vec<EmbeddingRecord>) -> Self {
        Self {
            location,
            manifest,
            records: records.into(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub const fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn records(&self) -> &[EmbeddingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
