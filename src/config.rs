use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable holding the OpenAI credential.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable that overrides `embedding.model`.
pub const EMBEDDING_MODEL_ENV: &str = "OPENAI_EMBEDDING_MODEL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KnowledgeConfig {
    #[serde(default = "default_knowledge_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub state_path: Option<PathBuf>,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            dir: default_knowledge_dir(),
            store_path: None,
            state_path: None,
        }
    }
}

impl KnowledgeConfig {
    /// Knowledge base rooted at `dir`, with store and state files inside it.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            store_path: None,
            state_path: None,
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| self.dir.join("ingested_chunks.json"))
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(|| self.dir.join(".ingest_state.json"))
    }
}

fn default_knowledge_dir() -> PathBuf {
    PathBuf::from("./knowledge_base")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    800
}
fn default_chunk_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            url: None,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_batch_size() -> usize {
    20
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    3
}

/// Read, parse, and validate a TOML configuration file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;
    parse_config(&content)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        return load_config(path);
    }
    tracing::debug!(path = %path.display(), "config file not found, using defaults");
    let mut config = Config::default();
    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content)
        .map_err(|e| Error::config(format!("failed to parse config file: {}", e)))?;
    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(model) = std::env::var(EMBEDDING_MODEL_ENV) {
        if !model.trim().is_empty() {
            config.embedding.model = model.trim().to_string();
        }
    }
}

pub fn validate(config: &Config) -> Result<()> {
    if config.chunking.size == 0 {
        return Err(Error::config("chunking.size must be > 0"));
    }
    // A window must always move forward.
    if config.chunking.overlap >= config.chunking.size {
        return Err(Error::config(format!(
            "chunking.overlap ({}) must be smaller than chunking.size ({})",
            config.chunking.overlap, config.chunking.size
        )));
    }

    if config.retrieval.limit == 0 {
        return Err(Error::config("retrieval.limit must be >= 1"));
    }

    if config.embedding.batch_size == 0 {
        return Err(Error::config("embedding.batch_size must be > 0"));
    }
    if config.embedding.model.trim().is_empty() {
        return Err(Error::config("embedding.model must not be empty"));
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => {
            return Err(Error::config(format!(
                "unknown embedding provider: '{}'. Must be disabled, openai, or ollama.",
                other
            )))
        }
    }

    Ok(())
}
