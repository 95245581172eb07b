//! # CV RAG
//!
//! Retrieval layer for tailored CV generation.
//!
//! A directory of PDFs is turned into overlapping text chunks, each chunk is
//! embedded by an external model, and the result is persisted as one JSON
//! chunk store keyed by a signature of the source files. At query time the
//! store is held in memory and the chunks most similar to an embedded query
//! are returned as plain text snippets for the generation prompt.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────────────┐   ┌──────────────┐
//! │ PDFs (kb) │──▶│ Ingest               │──▶│ Chunk store  │
//! │ *.pdf     │   │ extract→chunk→embed  │   │ JSON + state │
//! └───────────┘   └──────────────────────┘   └──────┬───────┘
//!                                                   ▼
//!                 ┌──────────────┐           ┌──────────────┐
//!  query ────────▶│  Retriever   │──────────▶│ Similarity   │
//!                 │ embed query  │◀──────────│ index (top-k)│
//!                 └──────────────┘  snippets └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cvrag ingest                  # build the chunk store (cached by signature)
//! cvrag ingest --force          # rebuild regardless of the cache
//! cvrag query "cloud architecture experience" --limit 3
//! cvrag stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Chunk records and ingestion state |
//! | [`chunk`] | Sliding-window text chunking |
//! | [`embedding`] | Embedding backends and batching client |
//! | [`extract`] | Page-by-page PDF text extraction |
//! | [`store`] | Atomic chunk store persistence |
//! | [`ingest`] | Ingestion pipeline with signature cache |
//! | [`search`] | Cosine-similarity index |
//! | [`retrieval`] | Query façade for prompt context |
//! | [`stats`] | Chunk store summary |

pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod retrieval;
pub mod search;
pub mod stats;
pub mod store;

#[cfg(test)]
#[path = "../tests/common/pdf.rs"]
pub(crate) mod test_pdf;

pub use error::{Error, Result};
