//! Chunk store and ingestion state persistence.
//!
//! The chunk store is a single JSON array of [`ChunkRecord`]s; the state file
//! is `{"signature": "..."}`. Both are replaced wholesale by [`commit`]:
//! each is written to a temporary file in its destination directory, synced,
//! and renamed into place. The store is renamed first, so an interrupted
//! commit leaves a state that no longer matches and the next run rebuilds.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::models::{ChunkRecord, IngestState};

/// Load a chunk store. A missing file is an empty store.
///
/// # Errors
///
/// Fails on unreadable or malformed JSON, on a chunk with empty content, or
/// when embedding lengths differ between chunks.
pub fn load_chunks(path: &Path) -> Result<Vec<ChunkRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    let chunks: Vec<ChunkRecord> = serde_json::from_str(&content)?;
    check_chunks(path, &chunks)?;
    Ok(chunks)
}

fn check_chunks(path: &Path, chunks: &[ChunkRecord]) -> Result<()> {
    let invalid = |message: String| Error::Store {
        path: path.to_path_buf(),
        message,
    };

    let dims = chunks.first().map(|c| c.embedding.len());
    for chunk in chunks {
        if chunk.content.is_empty() {
            return Err(invalid(format!("chunk {} has empty content", chunk.chunk_id)));
        }
        if Some(chunk.embedding.len()) != dims {
            return Err(invalid(format!(
                "chunk {} has {} dimensions, expected {}",
                chunk.chunk_id,
                chunk.embedding.len(),
                dims.unwrap_or(0)
            )));
        }
    }
    Ok(())
}

/// Load the persisted ingestion state, if any.
pub fn load_state(path: &Path) -> Result<Option<IngestState>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Persist `chunks` and `state` together, replacing any previous pair.
pub fn commit(
    store_path: &Path,
    state_path: &Path,
    chunks: &[ChunkRecord],
    state: &IngestState,
) -> Result<()> {
    check_chunks(store_path, chunks)?;

    let store = write_temp(store_path, &serde_json::to_vec_pretty(chunks)?)?;
    let state_file = write_temp(state_path, &serde_json::to_vec_pretty(state)?)?;

    persist(store, store_path)?;
    persist(state_file, state_path)?;
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn write_temp(dest: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let dir = parent_dir(dest);
    std::fs::create_dir_all(&dir)?;
    let mut file = NamedTempFile::new_in(&dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    Ok(file)
}

fn persist(file: NamedTempFile, dest: &Path) -> Result<()> {
    file.persist(dest).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
