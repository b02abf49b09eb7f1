//! Immutable vector index snapshots.
//!
//! An [`IndexSnapshot`] is the unit that vector stores persist and hand out:
//! a manifest plus the embedded chunks in insertion order. Snapshots are
//! validated as a whole when created or loaded and never mutated afterwards,
//! so a reader holding one always sees a complete index.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};

/// Snapshot layout version written by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// Summary information stored alongside the entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    /// Length of every stored vector.
    pub dimensions: usize,
    pub entry_count: usize,
    /// Model that produced the vectors.
    pub embedding_model: String,
    pub created_at: DateTime<Utc>,
}

/// A complete, validated index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    manifest: IndexManifest,
    entries: Vec<Chunk>,
}

impl IndexSnapshot {
    /// Build a snapshot from embedded chunks, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if the entries are inconsistent
    /// (see [`validate`](Self::validate)).
    pub fn new(entries: Vec<Chunk>, embedding_model: impl Into<String>) -> Result<Self> {
        let dimensions = entries.first().map_or(0, |c| c.embedding.len());
        let snapshot = Self {
            manifest: IndexManifest {
                format_version: FORMAT_VERSION,
                dimensions,
                entry_count: entries.len(),
                embedding_model: embedding_model.into(),
                created_at: Utc::now(),
            },
            entries,
        };
        snapshot.validate().map_err(|message| RagError::VectorStoreError {
            backend: "snapshot".into(),
            message,
        })?;
        Ok(snapshot)
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// Stored chunks in insertion order.
    pub fn entries(&self) -> &[Chunk] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by chunk id.
    pub fn get(&self, id: &str) -> Option<&Chunk> {
        self.entries.iter().find(|c| c.id == id)
    }

    /// Check the invariants every stored snapshot must satisfy.
    ///
    /// Returns a description of the first violation.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let manifest = &self.manifest;
        if manifest.format_version != FORMAT_VERSION {
            return Err(format!("unsupported format version {}", manifest.format_version));
        }
        if manifest.entry_count != self.entries.len() {
            return Err(format!(
                "manifest lists {} entries but {} are stored",
                manifest.entry_count,
                self.entries.len()
            ));
        }
        if !self.entries.is_empty() && manifest.dimensions == 0 {
            return Err("stored vectors are empty".to_string());
        }
        let mut seen = HashSet::with_capacity(self.entries.len());
        for chunk in &self.entries {
            if chunk.embedding.len() != manifest.dimensions {
                return Err(format!(
                    "entry '{}' has {} dimensions, expected {}",
                    chunk.id,
                    chunk.embedding.len(),
                    manifest.dimensions
                ));
            }
            if !seen.insert(chunk.id.as_str()) {
                return Err(format!("duplicate entry '{}'", chunk.id));
            }
        }
        Ok(())
    }

    /// Return the `top_k` entries most similar to `embedding`, best first.
    ///
    /// Equal scores keep insertion order, so results are deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if the query vector's length
    /// differs from the index dimensionality.
    pub fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if embedding.len() != self.manifest.dimensions {
            return Err(RagError::VectorStoreError {
                backend: "snapshot".into(),
                message: format!(
                    "query has {} dimensions, index has {}",
                    embedding.len(),
                    self.manifest.dimensions
                ),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, chunk)| (position, cosine_similarity(&chunk.embedding, embedding)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| SearchResult { chunk: self.entries[position].clone(), score })
            .collect())
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::{Chunker, FixedSizeChunker};
    use crate::document::Document;

    fn entry(id: &str, embedding: Vec<f32>) -> Chunk {
        let mut chunk = FixedSizeChunker::try_new(64, 0)
            .unwrap()
            .chunk(&Document::new(id, format!("text of {id}")))
            .remove(0);
        chunk.embedding = embedding;
        chunk
    }

    #[test]
    fn search_orders_by_score_then_insertion() {
        let snapshot = IndexSnapshot::new(
            vec![
                entry("a", vec![0.0, 1.0]),
                entry("b", vec![1.0, 0.0]),
                entry("c", vec![2.0, 0.0]),
                entry("d", vec![1.0, 1.0]),
            ],
            "test",
        )
        .unwrap();

        let results = snapshot.search(&[1.0, 0.0], 3).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.chunk.document_id.as_str()).collect();
        // b and c tie at 1.0; b was inserted first.
        assert_eq!(ids, vec!["b", "c", "d"]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn search_handles_zero_k_and_dimension_mismatch() {
        let snapshot = IndexSnapshot::new(vec![entry("a", vec![1.0, 0.0])], "test").unwrap();
        assert!(snapshot.search(&[1.0, 0.0], 0).unwrap().is_empty());
        assert!(matches!(
            snapshot.search(&[1.0, 0.0, 0.0], 1),
            Err(RagError::VectorStoreError { .. })
        ));
    }

    #[test]
    fn rejects_inconsistent_entries() {
        let ragged = vec![entry("a", vec![1.0, 0.0]), entry("b", vec![1.0])];
        assert!(IndexSnapshot::new(ragged, "test").is_err());

        let dup = vec![entry("a", vec![1.0]), entry("a", vec![0.5])];
        assert!(IndexSnapshot::new(dup, "test").is_err());

        let unembedded = vec![entry("a", Vec::new())];
        assert!(IndexSnapshot::new(unembedded, "test").is_err());
    }

    #[test]
    fn cosine_similarity_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
