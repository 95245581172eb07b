//! In-memory cosine-similarity index over a loaded chunk store.
//!
//! Every chunk's Euclidean norm is computed once at load time. A query is
//! scored against every chunk (brute force; the knowledge base is small),
//! stable-sorted by descending score, and only strictly positive scores are
//! returned. Ties keep store order.
//!
//! The index is immutable after construction and can be shared across
//! concurrent retrievals behind an `Arc` without locking.

use std::path::Path;

use crate::error::Result;
use crate::models::{ChunkRecord, ScoredChunk};
use crate::store;

/// An embedding together with its precomputed norm.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryVector {
    pub values: Vec<f32>,
    pub norm: f32,
}

impl QueryVector {
    pub fn new(values: Vec<f32>) -> Self {
        let norm = vector_norm(&values);
        Self { values, norm }
    }
}

/// Euclidean norm, with a zero norm replaced by `1.0`.
///
/// An all-zero vector therefore keeps a dot product of zero and scores
/// `0.0` against everything instead of dividing by zero.
pub fn vector_norm(values: &[f32]) -> f32 {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        1.0
    } else {
        norm
    }
}

/// Cosine similarity using precomputed norms.
///
/// Returns `0.0` if either vector is empty, either norm is zero, or the
/// lengths differ.
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn similarity(
    embedding: &[f32],
    embedding_norm: f32,
    query: &[f32],
    query_norm: f32,
) -> f32 {
    if embedding.is_empty()
        || query.is_empty()
        || embedding_norm == 0.0
        || query_norm == 0.0
        || embedding.len() != query.len()
    {
        return 0.0;
    }
    let dot: f32 = embedding.iter().zip(query).map(|(a, b)| a * b).sum();
    dot / (embedding_norm * query_norm)
}

#[derive(Debug, Default)]
pub struct SimilarityIndex {
    chunks: Vec<ChunkRecord>,
    norms: Vec<f32>,
}

impl SimilarityIndex {
    pub fn new(chunks: Vec<ChunkRecord>) -> Self {
        let norms = chunks.iter().map(|c| vector_norm(&c.embedding)).collect();
        Self { chunks, norms }
    }

    /// Load the chunk store at `path`. A missing file gives an empty index.
    pub fn load(path: &Path) -> Result<Self> {
        let chunks = store::load_chunks(path)?;
        tracing::info!(chunks = chunks.len(), path = %path.display(), "similarity index loaded");
        Ok(Self::new(chunks))
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[ChunkRecord] {
        &self.chunks
    }

    /// Embedding length shared by every chunk, if the index is non-empty.
    pub fn dims(&self) -> Option<usize> {
        self.chunks.first().map(|c| c.embedding.len())
    }

    /// Up to `k` chunks with a strictly positive score, best first.
    pub fn search(&self, query: &QueryVector, k: usize) -> Vec<ScoredChunk<'_>> {
        let mut scored: Vec<ScoredChunk<'_>> = self
            .chunks
            .iter()
            .zip(&self.norms)
            .map(|(chunk, &norm)| ScoredChunk {
                score: similarity(&chunk.embedding, norm, &query.values, query.norm),
                chunk,
            })
            .collect();

        // sort_by is stable: equal scores stay in store order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));

        scored
            .into_iter()
            .filter(|s| s.score > 0.0)
            .take(k)
            .collect()
    }

    /// Content of the top `k` positive-score chunks. Never padded.
    pub fn top_k(&self, query: &QueryVector, k: usize) -> Vec<String> {
        self.search(query, k)
            .into_iter()
            .map(|s| s.chunk.content.clone())
            .collect()
    }
}
