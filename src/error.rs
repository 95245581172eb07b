//! Error taxonomy for the retrieval subsystem.
//!
//! Ingestion surfaces every variant to its caller. Retrieval never does:
//! [`crate::retrieval::Retriever`] logs embedding failures and answers with
//! an empty context instead.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid settings, or no embedding credential when one is required.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The remote embedding call failed or returned an unexpected shape.
    #[error("embedding service error: {0}")]
    EmbeddingService(String),

    /// A single PDF page could not be turned into text. Always caught by
    /// the extractor and replaced with empty text for that page.
    #[error("failed to extract page {page} of {}: {message}", .path.display())]
    PageExtraction {
        path: PathBuf,
        page: u32,
        message: String,
    },

    /// The PDF could not be opened at all.
    #[error("failed to read PDF {}: {message}", .path.display())]
    Extraction { path: PathBuf, message: String },

    /// A persisted chunk store violates the chunk invariants.
    #[error("invalid chunk store {}: {message}", .path.display())]
    Store { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn embedding(message: impl Into<String>) -> Self {
        Error::EmbeddingService(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::EmbeddingService(err.to_string())
    }
}
