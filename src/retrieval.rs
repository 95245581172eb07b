//! Retrieval façade used by the CV-generation layer.
//!
//! [`Retriever::get_context`] never fails. An empty query, an empty index,
//! a missing embedding backend, or a failed embedding call all produce an
//! empty context, which callers must tolerate.

use std::sync::Arc;

use crate::embedding::EmbeddingClient;
use crate::search::{QueryVector, SimilarityIndex};

pub const DEFAULT_LIMIT: usize = 3;

#[derive(Clone)]
pub struct Retriever {
    index: Arc<SimilarityIndex>,
    embedder: Option<EmbeddingClient>,
}

impl Retriever {
    pub fn new(index: Arc<SimilarityIndex>, embedder: Option<EmbeddingClient>) -> Self {
        Self { index, embedder }
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    /// Up to `limit` chunk texts most similar to `query`, best first.
    pub async fn get_context(&self, query: &str, limit: usize) -> Vec<String> {
        match self.embed_query(query).await {
            Some(vector) => self.index.top_k(&vector, limit),
            None => Vec::new(),
        }
    }

    /// Embed `query`, or `None` when retrieval should short-circuit.
    ///
    /// The empty-query and empty-index checks run before any network call.
    pub async fn embed_query(&self, query: &str) -> Option<QueryVector> {
        if query.is_empty() || self.index.is_empty() {
            return None;
        }
        let embedder = self.embedder.as_ref()?;

        match embedder.embed_one(query).await {
            Ok(values) if !values.is_empty() => Some(QueryVector::new(values)),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!("query embedding failed, returning empty context: {}", err);
                None
            }
        }
    }
}

/// Append retrieved snippets to a generation prompt, separated by blank lines.
pub fn compose_prompt(base_prompt: &str, snippets: &[String]) -> String {
    if snippets.is_empty() {
        return base_prompt.to_string();
    }
    format!("{}\n\n{}", base_prompt, snippets.join("\n\n"))
}
