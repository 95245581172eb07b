//! End-to-end tests for ingestion and retrieval through the public API.
//!
//! PDFs are generated on the fly; embeddings come from an in-process fake
//! backend that maps keywords to fixed directions and counts its calls.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tempfile::TempDir;

use cv_rag::config::{ChunkingConfig, KnowledgeConfig};
use cv_rag::embedding::{EmbeddingBackend, EmbeddingClient};
use cv_rag::ingest::IngestPipeline;
use cv_rag::retrieval::{compose_prompt, Retriever};
use cv_rag::search::SimilarityIndex;
use cv_rag::store;
use cv_rag::{Error, Result};

mod common;
use common::pdf::{minimal_pdf, pdf_with_streams, text_stream, UNDECODABLE_STREAM};

/// `[rust, cooking]` axes: texts mentioning "rust" point along x, texts
/// mentioning "cooking" along y, anything else is the zero vector.
#[derive(Default)]
struct KeywordBackend {
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingBackend for KeywordBackend {
    async fn embed(&self, _model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                let t = t.to_lowercase();
                vec![
                    if t.contains("rust") { 1.0 } else { 0.0 },
                    if t.contains("cooking") { 1.0 } else { 0.0 },
                ]
            })
            .collect())
    }
}

struct BrokenBackend;

#[async_trait]
impl EmbeddingBackend for BrokenBackend {
    async fn embed(&self, _model: &str, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::EmbeddingService("429 Too Many Requests".to_string()))
    }
}

fn setup_kb() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let kb = tmp.path().join("knowledge_base");
    fs::create_dir_all(&kb).unwrap();
    fs::write(
        kb.join("engineering.pdf"),
        minimal_pdf(&["Five years of Rust systems programming"]),
    )
    .unwrap();
    fs::write(
        kb.join("hobbies.pdf"),
        minimal_pdf(&["Weekend cooking classes and baking"]),
    )
    .unwrap();
    (tmp, kb)
}

fn pipeline(kb: &Path, backend: Arc<dyn EmbeddingBackend>) -> IngestPipeline {
    IngestPipeline::new(
        &KnowledgeConfig::in_dir(kb),
        ChunkingConfig::default(),
        Some(EmbeddingClient::new(backend, "test-model", 20)),
    )
}

#[tokio::test]
async fn test_ingest_then_retrieve() {
    let (_tmp, kb) = setup_kb();
    let backend = Arc::new(KeywordBackend::default());

    let store_path = pipeline(&kb, backend.clone())
        .ingest(&kb, false)
        .await
        .unwrap();

    let index = SimilarityIndex::load(&store_path).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.dims(), Some(2));
    let sources: Vec<&str> = index.chunks().iter().map(|c| c.source.as_str()).collect();
    assert_eq!(sources, vec!["engineering.pdf", "hobbies.pdf"]);

    let retriever = Retriever::new(
        Arc::new(index),
        Some(EmbeddingClient::new(backend.clone(), "test-model", 20)),
    );
    let context = retriever.get_context("rust experience", 3).await;
    assert_eq!(context.len(), 1);
    assert!(context[0].contains("Rust systems programming"));

    let prompt = compose_prompt("Write a profile summary.", &context);
    assert!(prompt.starts_with("Write a profile summary.\n\n"));
}

#[tokio::test]
async fn test_unchanged_sources_skip_embedding() {
    let (_tmp, kb) = setup_kb();
    let backend = Arc::new(KeywordBackend::default());
    let pipeline = pipeline(&kb, backend.clone());

    let first = pipeline.run(&kb, false).await.unwrap();
    let before = fs::read(&first.store_path).unwrap();
    let calls = backend.calls.load(Ordering::SeqCst);
    assert_eq!(calls, 2); // one batch per file

    let second = pipeline.run(&kb, false).await.unwrap();
    assert!(second.cache_hit);
    assert_eq!(backend.calls.load(Ordering::SeqCst), calls);
    assert_eq!(fs::read(&second.store_path).unwrap(), before);
}

#[tokio::test]
async fn test_touching_a_file_triggers_rebuild() {
    let (_tmp, kb) = setup_kb();
    let backend = Arc::new(KeywordBackend::default());
    let pipeline = pipeline(&kb, backend.clone());

    let first = pipeline.run(&kb, false).await.unwrap();
    let calls = backend.calls.load(Ordering::SeqCst);

    let file = fs::File::options()
        .write(true)
        .open(kb.join("hobbies.pdf"))
        .unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(3600))
        .unwrap();

    let second = pipeline.run(&kb, false).await.unwrap();
    assert!(!second.cache_hit);
    assert_ne!(second.signature, first.signature);
    assert!(backend.calls.load(Ordering::SeqCst) > calls);
}

#[tokio::test]
async fn test_failed_embedding_keeps_previous_store() {
    let (_tmp, kb) = setup_kb();
    let good = Arc::new(KeywordBackend::default());
    let first = pipeline(&kb, good).run(&kb, false).await.unwrap();
    let before = fs::read(&first.store_path).unwrap();
    let state_before = store::load_state(&kb.join(".ingest_state.json")).unwrap();

    let err = pipeline(&kb, Arc::new(BrokenBackend))
        .run(&kb, true)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmbeddingService(_)));

    assert_eq!(fs::read(&first.store_path).unwrap(), before);
    assert_eq!(
        store::load_state(&kb.join(".ingest_state.json")).unwrap(),
        state_before
    );
}

#[tokio::test]
async fn test_unreadable_page_does_not_abort() {
    let (_tmp, kb) = setup_kb();
    // page 2 of 3 cannot be decoded; its neighbours still are
    fs::write(
        kb.join("portfolio.pdf"),
        pdf_with_streams(&[
            text_stream("Rust compiler contributions"),
            UNDECODABLE_STREAM.to_string(),
            text_stream("Cooking blog with weekly recipes"),
        ]),
    )
    .unwrap();

    let backend = Arc::new(KeywordBackend::default());
    let report = pipeline(&kb, backend).run(&kb, false).await.unwrap();
    assert!(!report.cache_hit);
    assert_eq!(report.files, 3);

    let chunks = store::load_chunks(&report.store_path).unwrap();
    let portfolio: Vec<&str> = chunks
        .iter()
        .filter(|c| c.source == "portfolio.pdf")
        .map(|c| c.content.as_str())
        .collect();
    assert_eq!(portfolio.len(), 1);
    assert!(portfolio[0].contains("Rust compiler contributions"));
    assert!(portfolio[0].contains("Cooking blog with weekly recipes"));
    assert!(!portfolio[0].contains("lost words"));
}

#[tokio::test]
async fn test_empty_knowledge_base_returns_nothing() {
    let tmp = TempDir::new().unwrap();
    let kb = tmp.path().join("kb");
    let backend = Arc::new(KeywordBackend::default());

    let store_path = pipeline(&kb, backend.clone())
        .ingest(&kb, false)
        .await
        .unwrap();
    let index = SimilarityIndex::load(&store_path).unwrap();
    assert!(index.is_empty());

    let retriever = Retriever::new(
        Arc::new(index),
        Some(EmbeddingClient::new(backend.clone(), "test-model", 20)),
    );
    assert!(retriever.get_context("anything", 3).await.is_empty());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}
