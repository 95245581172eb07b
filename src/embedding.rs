//! Embedding backend abstraction and the batching client built on it.
//!
//! - **[`EmbeddingBackend`]**: the provider boundary, `embed(model, texts) -> vectors`.
//! - **[`OpenAiBackend`]**: `POST {url}/embeddings` with a bearer credential.
//! - **[`OllamaBackend`]**: `POST {url}/api/embed` on a local Ollama instance.
//! - **[`EmbeddingClient`]**: splits input into fixed-size batches, preserves
//!   input order, and checks that every batch comes back with one vector
//!   per text.
//!
//! No backend retries. A failed call surfaces as
//! [`Error::EmbeddingService`] and retrying is left to the caller.
//!
//! # Provider Selection
//!
//! ```rust,no_run
//! # use cv_rag::config::EmbeddingConfig;
//! # use cv_rag::embedding::create_client;
//! let mut config = EmbeddingConfig::default();
//! config.provider = "disabled".to_string();
//! assert!(create_client(&config).unwrap().is_none());
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmbeddingConfig, OPENAI_API_KEY_ENV};
use crate::error::{Error, Result};

const OPENAI_DEFAULT_URL: &str = "https://api.openai.com/v1";
const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// A remote (or local) service that turns texts into vectors.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed `texts` with `model`. Implementations return vectors in input order.
    async fn embed(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Batching front-end over an [`EmbeddingBackend`].
#[derive(Clone)]
pub struct EmbeddingClient {
    backend: Arc<dyn EmbeddingBackend>,
    model: String,
    batch_size: usize,
}

impl EmbeddingClient {
    pub fn new(
        backend: Arc<dyn EmbeddingBackend>,
        model: impl Into<String>,
        batch_size: usize,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed every text, `batch_size` texts per backend call.
    ///
    /// An empty input makes no backend calls.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for (i, batch) in texts.chunks(self.batch_size).enumerate() {
            tracing::debug!(batch = i, size = batch.len(), model = %self.model, "embedding batch");
            let result = self.backend.embed(&self.model, batch).await?;
            if result.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "backend returned {} embeddings for {} inputs",
                    result.len(),
                    batch.len()
                )));
            }
            vectors.extend(result);
        }

        Ok(vectors)
    }

    /// Embed a single text (a batch of one).
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("empty embedding response"))
    }
}

/// Build the client described by `config`.
///
/// Returns `Ok(None)` when embeddings are unconfigured: the provider is
/// `"disabled"`, or it is `"openai"` and no credential is set.
///
/// # Errors
///
/// Returns [`Error::Configuration`] for an unknown provider, or
/// [`Error::EmbeddingService`] if the HTTP client cannot be built.
pub fn create_client(config: &EmbeddingConfig) -> Result<Option<EmbeddingClient>> {
    let backend: Arc<dyn EmbeddingBackend> = match config.provider.as_str() {
        "disabled" => return Ok(None),
        "openai" => match openai_api_key() {
            Some(key) => Arc::new(OpenAiBackend::new(
                key,
                config.url.as_deref().unwrap_or(OPENAI_DEFAULT_URL),
                Duration::from_secs(config.timeout_secs),
            )?),
            None => {
                tracing::debug!("{} not set, embeddings unconfigured", OPENAI_API_KEY_ENV);
                return Ok(None);
            }
        },
        "ollama" => Arc::new(OllamaBackend::new(
            config.url.as_deref().unwrap_or(OLLAMA_DEFAULT_URL),
            Duration::from_secs(config.timeout_secs),
        )?),
        other => {
            return Err(Error::config(format!(
                "unknown embedding provider: {}",
                other
            )))
        }
    };

    Ok(Some(EmbeddingClient::new(
        backend,
        config.model.clone(),
        config.batch_size,
    )))
}

fn openai_api_key() -> Option<String> {
    std::env::var(OPENAI_API_KEY_ENV)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

// ============ OpenAI ============

/// Backend for OpenAI-compatible `/embeddings` endpoints.
pub struct OpenAiBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl EmbeddingBackend for OpenAiBackend {
    async fn embed(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest { model, input: texts })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        parse_openai_response(&body)
    }
}

/// Decode an OpenAI embeddings response, ordering entries by their `index`.
fn parse_openai_response(body: &str) -> Result<Vec<Vec<f32>>> {
    let mut parsed: OpenAiResponse = serde_json::from_str(body)
        .map_err(|e| Error::embedding(format!("invalid OpenAI response: {}", e)))?;
    parsed.data.sort_by_key(|entry| entry.index);
    Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
}

// ============ Ollama ============

/// Backend for a local Ollama instance (`/api/embed`). Needs no credential.
pub struct OllamaBackend {
    client: reqwest::Client,
    url: String,
}

impl OllamaBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingBackend for OllamaBackend {
    async fn embed(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(format!("{}/api/embed", self.url))
            .json(&EmbeddingRequest { model, input: texts })
            .send()
            .await
            .map_err(|e| {
                Error::embedding(format!(
                    "Ollama connection error (is Ollama running at {}?): {}",
                    self.url, e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "Ollama API error {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        let parsed: OllamaResponse = serde_json::from_str(&body)
            .map_err(|e| Error::embedding(format!("invalid Ollama response: {}", e)))?;
        Ok(parsed.embeddings)
    }
}
