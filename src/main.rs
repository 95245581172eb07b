//! # CV RAG CLI (`cvrag`)
//!
//! Builds and queries the knowledge base that grounds generated CVs.
//!
//! ## Usage
//!
//! ```bash
//! cvrag --config ./config/cvrag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cvrag ingest [--force]` | Build the chunk store from the knowledge base PDFs |
//! | `cvrag query "<text>"` | Print the snippets retrieved for a query |
//! | `cvrag stats` | Summarize the persisted chunk store |
//!
//! Logs go to stderr (`RUST_LOG`, default `cv_rag=info`); stdout carries
//! only command output.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cv_rag::config::{self, Config};
use cv_rag::embedding;
use cv_rag::ingest::IngestPipeline;
use cv_rag::retrieval::Retriever;
use cv_rag::search::SimilarityIndex;
use cv_rag::{stats, Error};

/// CV RAG: retrieval over a local PDF knowledge base for CV generation.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means built-in defaults.
#[derive(Parser)]
#[command(
    name = "cvrag",
    about = "Retrieval over a local PDF knowledge base for tailored CV generation",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/cvrag.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, chunk, and embed the knowledge base PDFs.
    ///
    /// Skipped when the PDFs' names, modification times, and sizes match
    /// the previous run and the chunk store still exists.
    Ingest {
        /// Rebuild even if the knowledge base looks unchanged.
        #[arg(long)]
        force: bool,
    },

    /// Retrieve the snippets most similar to a query.
    ///
    /// Runs a cached ingestion first. Without an embedding backend the
    /// result is empty rather than an error.
    Query {
        /// Query text.
        query: String,

        /// Maximum number of snippets (defaults to `retrieval.limit`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show chunk store statistics.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cv_rag=info,cvrag=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;

    match cli.command {
        Commands::Ingest { force } => run_ingest(&cfg, force).await?,
        Commands::Query { query, limit } => run_query(&cfg, &query, limit).await?,
        Commands::Stats => stats::run_stats(&cfg)?,
    }

    Ok(())
}

async fn run_ingest(cfg: &Config, force: bool) -> Result<()> {
    let embedder = embedding::create_client(&cfg.embedding)?;
    let pipeline = IngestPipeline::from_config(cfg, embedder);
    let report = pipeline
        .run(&cfg.knowledge.dir, force)
        .await
        .context("ingestion failed")?;

    println!("ingest {}", cfg.knowledge.dir.display());
    println!("  files: {}", report.files);
    if report.cache_hit {
        println!("  unchanged, chunk store reused");
    } else {
        println!("  chunks written: {}", report.chunks);
    }
    println!("  signature: {}", report.signature);
    println!("  store: {}", report.store_path.display());
    println!("ok");
    Ok(())
}

async fn run_query(cfg: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    let embedder = embedding::create_client(&cfg.embedding)?;

    let pipeline = IngestPipeline::from_config(cfg, embedder.clone());
    match pipeline.run(&cfg.knowledge.dir, false).await {
        Ok(_) => {}
        Err(err @ Error::Configuration(_)) => {
            tracing::warn!("{}; querying the existing chunk store", err);
        }
        Err(err) => return Err(err).context("ingestion failed"),
    }

    let index = SimilarityIndex::load(pipeline.store_path())?;
    let retriever = Retriever::new(Arc::new(index), embedder);
    let limit = limit.unwrap_or(cfg.retrieval.limit);

    let hits = match retriever.embed_query(query).await {
        Some(vector) => retriever.index().search(&vector, limit),
        None => Vec::new(),
    };

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{}. [{:.4}] {} ({})",
            i + 1,
            hit.score,
            hit.chunk.chunk_id,
            hit.chunk.source
        );
        println!("   {}", hit.chunk.content);
        println!();
    }
    Ok(())
}
