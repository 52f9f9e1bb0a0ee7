//! On-disk layout of a knowledge base and in-memory similarity search.
//!
//! A knowledge base directory holds `records.json` (every embedding record,
//! in insertion order) and `manifest.json`. The manifest is written last and
//! removed first, so its presence marks a complete index.

use std::path::{Path, PathBuf};

use crate::domain::knowledge_base::MANIFEST_FORMAT_VERSION;
use crate::domain::{EmbeddingRecord, IndexManifest, ScoredChunk};
use crate::error::{RcaBotError, Result};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const RECORDS_FILE: &str = "records.json";

pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE)
}

pub fn records_path(dir: &Path) -> PathBuf {
    dir.join(RECORDS_FILE)
}

pub async fn exists(dir: &Path) -> bool {
    tokio::fs::try_exists(manifest_path(dir))
        .await
        .unwrap_or(false)
}

/// Replaces whatever index lives in `dir` with `records`.
///
/// Temporary files are removed again when any step fails. The old manifest
/// is gone from the moment the new files start being renamed into place.
pub async fn write(dir: &Path, manifest: &IndexManifest, records: &[EmbeddingRecord]) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;

    let records_tmp = dir.join(format!("{RECORDS_FILE}.tmp"));
    let manifest_tmp = dir.join(format!("{MANIFEST_FILE}.tmp"));

    let result = replace(dir, manifest, records, &records_tmp, &manifest_tmp).await;
    if result.is_err() {
        for tmp in [&records_tmp, &manifest_tmp] {
            if let Err(e) = tokio::fs::remove_file(tmp).await
                && e.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!("Failed to remove {}: {e}", tmp.display());
            }
        }
    }
    result
}

async fn replace(
    dir: &Path,
    manifest: &IndexManifest,
    records: &[EmbeddingRecord],
    records_tmp: &Path,
    manifest_tmp: &Path,
) -> Result<()> {
    tokio::fs::write(records_tmp, serde_json::to_vec(records)?).await?;
    tokio::fs::write(manifest_tmp, serde_json::to_vec_pretty(manifest)?).await?;

    match tokio::fs::remove_file(manifest_path(dir)).await {
        Ok(()) => tracing::debug!("Replacing existing index in {}", dir.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    tokio::fs::rename(records_tmp, records_path(dir)).await?;
    tokio::fs::rename(manifest_tmp, manifest_path(dir)).await?;

    Ok(())
}

pub async fn read(dir: &Path) -> Result<(IndexManifest, Vec<EmbeddingRecord>)> {
    let manifest_bytes = match tokio::fs::read(manifest_path(dir)).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RcaBotError::NotFound(dir.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    let manifest: IndexManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| RcaBotError::CorruptIndex(format!("{MANIFEST_FILE}: {e}")))?;

    if manifest.format_version != MANIFEST_FORMAT_VERSION {
        return Err(RcaBotError::CorruptIndex(format!(
            "unsupported format version {} (expected {MANIFEST_FORMAT_VERSION})",
            manifest.format_version
        )));
    }

    let records_bytes = match tokio::fs::read(records_path(dir)).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RcaBotError::CorruptIndex(format!("{RECORDS_FILE} is missing")));
        }
        Err(e) => return Err(e.into()),
    };
    let records: Vec<EmbeddingRecord> = serde_json::from_slice(&records_bytes)
        .map_err(|e| RcaBotError::CorruptIndex(format!("{RECORDS_FILE}: {e}")))?;

    if records.len() != manifest.record_count {
        return Err(RcaBotError::CorruptIndex(format!(
            "manifest lists {} records but {} were found",
            manifest.record_count,
            records.len()
        )));
    }
    if let Some(bad) = records
        .iter()
        .find(|r| r.dimension() != manifest.dimension)
    {
        return Err(RcaBotError::CorruptIndex(format!(
            "record {} has dimension {} (expected {})",
            bad.chunk.position,
            bad.dimension(),
            manifest.dimension
        )));
    }

    Ok((manifest, records))
}

/// Ranks records by cosine similarity to `query`, best first. Equal scores
/// keep insertion order.
pub fn rank(records: &[EmbeddingRecord], query: &[f32], limit: usize) -> Vec<ScoredChunk> {
    let mut scored: Vec<(usize, f32)> = records
        .iter()
        .enumerate()
        .map(|(i, record)| (i, cosine_similarity(query, &record.vector)))
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);

    scored
        .into_iter()
        .map(|(i, score)| ScoredChunk {
            chunk: records[i].chunk.clone(),
            score,
        })
        .collect()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
