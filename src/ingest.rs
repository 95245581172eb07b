//! Ingestion pipeline: PDFs → text → chunks → embeddings → chunk store.
//!
//! A run is skipped entirely when the signature of the source files matches
//! the persisted one and the store exists. The signature covers each PDF's
//! name, modification time, and size only, so an edit that preserves both
//! mtime and size is not detected; pass `force` to rebuild regardless.
//!
//! A rebuild accumulates every record in memory and commits the store and
//! state together at the end. Any failure before that point leaves the
//! previously persisted pair untouched.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::chunk::chunk_text;
use crate::config::{ChunkingConfig, Config, KnowledgeConfig};
use crate::embedding::EmbeddingClient;
use crate::error::{Error, Result};
use crate::extract;
use crate::models::{ChunkRecord, IngestState};
use crate::store;

/// Serializes ingestion runs within the process; a run reads and then
/// rewrites shared files.
static INGEST_LOCK: Mutex<()> = Mutex::const_new(());

/// Outcome of one [`IngestPipeline::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub store_path: PathBuf,
    pub cache_hit: bool,
    pub files: usize,
    pub chunks: usize,
    pub signature: String,
}

/// A source PDF and the stat fields that make up its part of the signature.
#[derive(Debug, Clone)]
struct SourceFile {
    path: PathBuf,
    name: String,
    stem: String,
    mtime_ns: u128,
    size: u64,
}

pub struct IngestPipeline {
    store_path: PathBuf,
    state_path: PathBuf,
    chunking: ChunkingConfig,
    embedder: Option<EmbeddingClient>,
}

impl IngestPipeline {
    pub fn new(
        knowledge: &KnowledgeConfig,
        chunking: ChunkingConfig,
        embedder: Option<EmbeddingClient>,
    ) -> Self {
        Self {
            store_path: knowledge.store_path(),
            state_path: knowledge.state_path(),
            chunking,
            embedder,
        }
    }

    pub fn from_config(config: &Config, embedder: Option<EmbeddingClient>) -> Self {
        Self::new(&config.knowledge, config.chunking.clone(), embedder)
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Ingest `source_dir` and return the chunk store path.
    pub async fn ingest(&self, source_dir: &Path, force: bool) -> Result<PathBuf> {
        Ok(self.run(source_dir, force).await?.store_path)
    }

    /// Ingest `source_dir`, reporting whether the cached store was reused.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] when a rebuild is needed and no embedding
    ///   client is available. A cache hit never needs one.
    /// - [`Error::EmbeddingService`] when an embedding call fails.
    /// - [`Error::Extraction`] / [`Error::Io`] when a source file cannot be read.
    pub async fn run(&self, source_dir: &Path, force: bool) -> Result<IngestReport> {
        let _guard = INGEST_LOCK.lock().await;

        std::fs::create_dir_all(source_dir)?;
        let files = discover_pdfs(source_dir)?;
        let signature = compute_signature(&files);

        if !force && self.is_cached(&signature)? {
            tracing::info!(
                files = files.len(),
                store = %self.store_path.display(),
                "knowledge base unchanged, reusing chunk store"
            );
            return Ok(IngestReport {
                store_path: self.store_path.clone(),
                cache_hit: true,
                files: files.len(),
                chunks: 0,
                signature,
            });
        }

        let embedder = self.embedder.as_ref().ok_or_else(|| {
            Error::config(
                "no embedding backend configured (set OPENAI_API_KEY); \
                 cannot embed the knowledge base",
            )
        })?;

        tracing::info!(files = files.len(), force, "ingesting knowledge base");

        let mut records: Vec<ChunkRecord> = Vec::new();
        for file in &files {
            let file_records = self.ingest_file(file, embedder).await?;
            tracing::info!(file = %file.name, chunks = file_records.len(), "file ingested");
            records.extend(file_records);
        }

        let state = IngestState {
            signature: signature.clone(),
        };
        store::commit(&self.store_path, &self.state_path, &records, &state)?;

        tracing::info!(
            files = files.len(),
            chunks = records.len(),
            store = %self.store_path.display(),
            "chunk store written"
        );

        Ok(IngestReport {
            store_path: self.store_path.clone(),
            cache_hit: false,
            files: files.len(),
            chunks: records.len(),
            signature,
        })
    }

    fn is_cached(&self, signature: &str) -> Result<bool> {
        if !self.store_path.exists() {
            return Ok(false);
        }
        match store::load_state(&self.state_path) {
            Ok(state) => Ok(state.is_some_and(|s| s.signature == signature)),
            Err(Error::Json(err)) => {
                tracing::warn!(
                    path = %self.state_path.display(),
                    "unreadable ingestion state, rebuilding: {}",
                    err
                );
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    async fn ingest_file(
        &self,
        file: &SourceFile,
        embedder: &EmbeddingClient,
    ) -> Result<Vec<ChunkRecord>> {
        let path = file.path.clone();
        let text = tokio::task::spawn_blocking(move || extract::extract_pdf_file(&path))
            .await
            .map_err(|e| Error::Extraction {
                path: file.path.clone(),
                message: e.to_string(),
            })??;

        let chunks = chunk_text(&text, self.chunking.size, self.chunking.overlap)?;
        let embeddings = embedder.embed(&chunks).await?;

        Ok(chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (content, embedding))| ChunkRecord {
                source: file.name.clone(),
                chunk_id: ChunkRecord::chunk_id_for(&file.stem, i),
                content,
                embedding,
            })
            .collect())
    }
}

/// PDFs directly inside `dir` (no recursion), sorted by file name.
/// Symlinks to PDFs count; dangling links are skipped.
fn discover_pdfs(dir: &Path) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("pdf") {
            continue;
        }
        // follows symlinks: a linked PDF is stat'ed through to its target
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "skipping dangling link");
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        if !metadata.is_file() {
            continue;
        }

        let mtime_ns = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let name = entry.file_name().to_string_lossy().into_owned();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());

        files.push(SourceFile {
            path,
            name,
            stem,
            mtime_ns,
            size: metadata.len(),
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// SHA-256 over one `name:mtime_ns:size` line per file, in name order.
fn compute_signature(files: &[SourceFile]) -> String {
    let mut hasher = Sha256::new();
    for file in files {
        hasher.update(format!("{}:{}:{}\n", file.name, file.mtime_ns, file.size).as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
