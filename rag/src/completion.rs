//! Text-completion service boundary.
//!
//! The orchestration stages only see [`CompletionProvider`]: a system
//! prompt and a user prompt in, raw text out. [`CompletionClient`] is the
//! HTTP implementation, speaking OpenAI-compatible, Anthropic, or Ollama
//! chat APIs depending on configuration. Responses are returned verbatim;
//! reasoning-block scrubbing happens at the call site (see `sanitize`), so
//! the provider stays a thin transport.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

const SERVICE: &str = "completion";

/// Opaque text-completion service.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run one completion. May fail or time out; never retried here.
    async fn complete(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, EngineError>;
}

/// Connection settings for [`CompletionClient`].
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Provider kind: "openai", "anthropic", "ollama", or "custom"
    /// (custom = any OpenAI-compatible endpoint)
    pub provider: String,
    /// API base URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// API key, if the provider needs one
    pub api_key: Option<String>,
    /// Per-call deadline
    pub timeout: Duration,
}

// ---------------------------------------------------------------------------
// OpenAI-compatible wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessageResponse,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessageResponse {
    /// Null for some reasoning models mid-thought
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

// ---------------------------------------------------------------------------
// Anthropic wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    system: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

// ---------------------------------------------------------------------------
// Ollama wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessageResponse,
}

#[derive(Debug, Deserialize)]
struct OllamaMessageResponse {
    content: String,
}

/// HTTP client for completion APIs.
#[derive(Debug)]
pub struct CompletionClient {
    client: reqwest::Client,
    provider: String,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl CompletionClient {
    /// Build a client from configuration.
    ///
    /// Fails fast with [`EngineError::MissingApiKey`] when a key-requiring
    /// provider has none, rather than at the first request.
    pub fn new(config: &CompletionConfig) -> Result<Self, EngineError> {
        if config.provider != "ollama" && config.api_key.is_none() {
            let env_var = match config.provider.as_str() {
                "anthropic" => "ANTHROPIC_API_KEY",
                _ => "OPENAI_API_KEY",
            };
            return Err(EngineError::MissingApiKey {
                env_var: env_var.to_string(),
            });
        }

        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .unwrap_or_default(),
            provider: config.provider.clone(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn call_openai(&self, system: &str, user: &str) -> Result<String, EngineError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let request = OpenAiRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAiMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                OpenAiMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            max_tokens: Some(4096),
            temperature: Some(0.0),
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        let response = builder
            .send()
            .await
            .map_err(|e| EngineError::from_reqwest(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(EngineError::Completion {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| EngineError::from_reqwest(SERVICE, e))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| EngineError::Malformed {
                service: SERVICE.to_string(),
                message: "response contained no choices".to_string(),
            })
    }

    async fn call_anthropic(&self, system: &str, user: &str) -> Result<String, EngineError> {
        let url = format!("{}/messages", self.endpoint);
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EngineError::MissingApiKey {
                env_var: "ANTHROPIC_API_KEY".to_string(),
            })?;

        let request = AnthropicRequest {
            model: self.model.clone(),
            system: system.to_string(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: user.to_string(),
            }],
            max_tokens: 4096,
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::from_reqwest(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(EngineError::Completion {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| EngineError::from_reqwest(SERVICE, e))?;
        parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| EngineError::Malformed {
                service: SERVICE.to_string(),
                message: "response contained no content blocks".to_string(),
            })
    }

    async fn call_ollama(&self, system: &str, user: &str) -> Result<String, EngineError> {
        let url = format!("{}/api/chat", self.endpoint);
        let request = OllamaRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAiMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                OpenAiMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::from_reqwest(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Completion {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: OllamaResponse = response
            .json()
            .await
            .map_err(|e| EngineError::from_reqwest(SERVICE, e))?;
        Ok(parsed.message.content)
    }
}

#[async_trait]
impl CompletionProvider for CompletionClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, EngineError> {
        match self.provider.as_str() {
            "openai" | "custom" => self.call_openai(system_prompt, user_prompt).await,
            "anthropic" => self.call_anthropic(system_prompt, user_prompt).await,
            "ollama" => self.call_ollama(system_prompt, user_prompt).await,
            other => Err(EngineError::UnsupportedProvider {
                provider: other.to_string(),
            }),
        }
    }
}
