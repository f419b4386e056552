//! Ollama embedding and generation backends over the local HTTP API.
//!
//! This module is only available when the `ollama` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::RagConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::TextGenerator;

const PROVIDER: &str = "Ollama";

fn build_client(timeout: Duration) -> std::result::Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

/// Pull the `error` field out of an Ollama error body, falling back to the raw body.
fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body)
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

// ── Embeddings ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// An [`EmbeddingProvider`] backed by Ollama's `/api/embed` endpoint.
///
/// The server is not contacted until the first call, so dimensionality is
/// declared up front and checked against every response.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::ollama::OllamaEmbeddingProvider;
///
/// let provider = OllamaEmbeddingProvider::from_config(&config)?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbeddingProvider {
    /// Create a provider for `model` on the server at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self> {
        Self::with_timeout(base_url, model, dimensions, Duration::from_secs(120))
    }

    /// Create a provider from the embedding fields of `config`.
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::with_timeout(
            &config.ollama_url,
            &config.embedding_model,
            config.embedding_dimensions,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Like [`new`](Self::new) with an explicit request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let model = model.into();
        if model.is_empty() {
            return Err(Self::err("model name must not be empty"));
        }
        if dimensions == 0 {
            return Err(Self::err("dimensions must be greater than zero"));
        }
        let client = build_client(timeout)
            .map_err(|e| Self::err(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, url: endpoint(&base_url.into(), "api/embed"), model, dimensions })
    }

    fn err(message: impl Into<String>) -> RagError {
        RagError::EmbeddingError { provider: PROVIDER.into(), message: message.into() }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| Self::err("API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "embedding batch");

        let request_body = EmbedRequest { model: &self.model, input: texts.to_vec() };
        let response =
            self.client.post(&self.url).json(&request_body).send().await.map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                Self::err(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(provider = PROVIDER, %status, "API error");
            return Err(Self::err(format!("API returned {status}: {detail}")));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            Self::err(format!("failed to parse response: {e}"))
        })?;

        if parsed.embeddings.len() != texts.len() {
            return Err(Self::err(format!(
                "expected {} embeddings, API returned {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }
        if let Some(bad) = parsed.embeddings.iter().find(|v| v.len() != self.dimensions) {
            return Err(Self::err(format!(
                "model '{}' returned {} dimensions, expected {}",
                self.model,
                bad.len(),
                self.dimensions
            )));
        }
        Ok(parsed.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

// ── Generation ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// A [`TextGenerator`] backed by Ollama's non-streaming `/api/generate` endpoint.
pub struct OllamaGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
    temperature: f32,
}

impl OllamaGenerator {
    /// Create a generator for `model` on the server at `base_url`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, model, 0.1, Duration::from_secs(120))
    }

    /// Create a generator from the generation fields of `config`.
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::with_timeout(
            &config.ollama_url,
            &config.generation_model,
            config.temperature,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Create a generator with explicit temperature and request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let model = model.into();
        if model.is_empty() {
            return Err(Self::err("model name must not be empty"));
        }
        let client = build_client(timeout)
            .map_err(|e| Self::err(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, url: endpoint(&base_url.into(), "api/generate"), model, temperature })
    }

    fn err(message: impl Into<String>) -> RagError {
        RagError::GenerationError { provider: PROVIDER.into(), message: message.into() }
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, prompt_len = prompt.len(), "generating");

        let request_body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature: self.temperature },
        };
        let response =
            self.client.post(&self.url).json(&request_body).send().await.map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                Self::err(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(provider = PROVIDER, %status, "API error");
            return Err(Self::err(format!("API returned {status}: {detail}")));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            Self::err(format!("failed to parse response: {e}"))
        })?;
        Ok(parsed.response)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trims_trailing_slash() {
        assert_eq!(endpoint("http://localhost:11434/", "api/embed"), "http://localhost:11434/api/embed");
        assert_eq!(endpoint("http://host:1", "api/generate"), "http://host:1/api/generate");
    }

    #[test]
    fn error_detail_prefers_error_field() {
        assert_eq!(error_detail(r#"{"error":"model not found"}"#.to_string()), "model not found");
        assert_eq!(error_detail("plain body".to_string()), "plain body");
    }

    #[test]
    fn constructors_validate() {
        assert!(OllamaEmbeddingProvider::new("http://localhost:11434", "", 384).is_err());
        assert!(OllamaEmbeddingProvider::new("http://localhost:11434", "all-minilm", 0).is_err());
        assert!(OllamaGenerator::new("http://localhost:11434", "").is_err());
        assert!(OllamaGenerator::from_config(&RagConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_typed_error() {
        let provider = OllamaEmbeddingProvider::with_timeout(
            "http://127.0.0.1:1",
            "all-minilm",
            4,
            Duration::from_millis(500),
        )
        .unwrap();
        assert!(matches!(provider.embed("x").await, Err(RagError::EmbeddingError { .. })));

        let generator =
            OllamaGenerator::with_timeout("http://127.0.0.1:1", "llama3", 0.1, Duration::from_millis(500))
                .unwrap();
        assert!(matches!(generator.generate("x").await, Err(RagError::GenerationError { .. })));
    }
}
