//! Core data types persisted by the ingestion pipeline and read by the
//! similarity index.

use serde::{Deserialize, Serialize};

/// One retrievable span of a knowledge-base document and its embedding.
///
/// Serialized as `{source, chunk_id, content, embedding}` inside the chunk
/// store's JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// File name of the originating PDF.
    pub source: String,
    /// `"<file-stem>#<index>"`, unique within a source.
    pub chunk_id: String,
    /// Whitespace-normalized text, never empty.
    pub content: String,
    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    pub fn chunk_id_for(stem: &str, index: usize) -> String {
        format!("{}#{}", stem, index)
    }
}

/// Persisted signature of the source files the current store was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IngestState {
    pub signature: String,
}

/// A chunk and its cosine similarity to a query.
#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    pub score: f32,
    pub chunk: &'a ChunkRecord,
}
