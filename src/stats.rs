//! Chunk store overview for `cvrag stats`.
//!
//! Shows what the retrieval layer would serve: chunk counts per source,
//! embedding dimensionality, and the signature of the last ingestion.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::config::Config;
use crate::error::Result;
use crate::store;

#[derive(Debug, Clone)]
pub struct StoreStats {
    pub store_path: PathBuf,
    pub store_bytes: u64,
    pub modified: Option<DateTime<Local>>,
    pub chunks: usize,
    pub dims: Option<usize>,
    pub signature: Option<String>,
    /// Chunk count per source file, ordered by name.
    pub by_source: BTreeMap<String, usize>,
}

pub fn collect_stats(config: &Config) -> Result<StoreStats> {
    let store_path = config.knowledge.store_path();
    let chunks = store::load_chunks(&store_path)?;
    let state = store::load_state(&config.knowledge.state_path())?;

    let metadata = std::fs::metadata(&store_path).ok();
    let mut by_source = BTreeMap::new();
    for chunk in &chunks {
        *by_source.entry(chunk.source.clone()).or_insert(0) += 1;
    }

    Ok(StoreStats {
        store_bytes: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
        modified: metadata
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Local>::from),
        chunks: chunks.len(),
        dims: chunks.first().map(|c| c.embedding.len()),
        signature: state.map(|s| s.signature),
        by_source,
        store_path,
    })
}

/// Run the stats command and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let stats = collect_stats(config)?;

    println!("Chunk store");
    println!("===========");
    println!();
    println!("  Store:       {}", stats.store_path.display());
    println!("  Size:        {}", format_bytes(stats.store_bytes));
    println!(
        "  Written:     {}",
        stats
            .modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string())
    );
    println!("  Chunks:      {}", stats.chunks);
    println!(
        "  Dimensions:  {}",
        stats
            .dims
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "  Signature:   {}",
        stats.signature.as_deref().unwrap_or("none")
    );

    if !stats.by_source.is_empty() {
        println!();
        println!("  {:<40} {:>8}", "SOURCE", "CHUNKS");
        println!("  {}", "-".repeat(49));
        for (source, count) in &stats.by_source {
            println!("  {:<40} {:>8}", source, count);
        }
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
