//! Embedding provider trait and implementations.
//!
//! OpenAI and Ollama expose the same request shape for embeddings, so the
//! implementations differ mainly in endpoint and authentication. Every
//! call carries the configured per-request deadline; a blown deadline
//! surfaces as [`EngineError::Timeout`] rather than a silent retry.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

const SERVICE: &str = "embedding";

/// Trait for embedding providers that convert text to vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngineError>;

    /// Generate embeddings for a batch of texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError>;

    /// Declared dimensionality of produced embeddings.
    fn dimensions(&self) -> usize;

    /// Model name.
    fn model_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// OpenAI-compatible embedding provider.
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dims: usize,
}

impl OpenAiEmbeddings {
    /// Create a new provider.
    ///
    /// # Arguments
    /// * `api_key` - API key for the endpoint
    /// * `model` - Model name (e.g., "text-embedding-3-small")
    /// * `endpoint` - API base (defaults to "https://api.openai.com/v1")
    /// * `dims` - Embedding dimensions (1536 for text-embedding-3-small)
    /// * `timeout` - Per-call deadline
    pub fn new(
        api_key: String,
        model: String,
        endpoint: Option<String>,
        dims: Option<usize>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: http_client(timeout),
            endpoint: endpoint.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            api_key,
            model,
            dims: dims.unwrap_or(1536),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results.into_iter().next().ok_or_else(|| EngineError::Malformed {
            service: SERVICE.to_string(),
            message: "empty embedding response".to_string(),
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        let url = format!("{}/embeddings", self.endpoint);
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::from_reqwest(SERVICE, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Unavailable {
                service: SERVICE.to_string(),
                message: format!("API error {status}: {body}"),
            });
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EngineError::from_reqwest(SERVICE, e))?;
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Ollama embedding provider, using the local `/api/embed` route.
pub struct OllamaEmbeddings {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dims: usize,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbeddings {
    /// Create a new Ollama provider.
    ///
    /// # Arguments
    /// * `model` - Model name (e.g., "nomic-embed-text")
    /// * `endpoint` - Ollama endpoint (defaults to "http://localhost:11434")
    /// * `dims` - Embedding dimensions (768 for nomic-embed-text)
    /// * `timeout` - Per-call deadline
    pub fn new(
        model: String,
        endpoint: Option<String>,
        dims: Option<usize>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: http_client(timeout),
            endpoint: endpoint.unwrap_or_else(|| "http://localhost:11434".to_string()),
            model,
            dims: dims.unwrap_or(768),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results.into_iter().next().ok_or_else(|| EngineError::Malformed {
            service: SERVICE.to_string(),
            message: "empty embedding response".to_string(),
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        let url = format!("{}/api/embed", self.endpoint);
        let request = OllamaEmbeddingRequest {
            model: self.model.clone(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::from_reqwest(SERVICE, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Unavailable {
                service: SERVICE.to_string(),
                message: format!("Ollama error {status}: {body}"),
            });
        }

        let result: OllamaEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EngineError::from_reqwest(SERVICE, e))?;
        Ok(result.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
