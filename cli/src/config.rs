//! # Configuration Management
//!
//! This module handles loading and saving CLI configuration: the LLM
//! provider, the embedding provider, the ANN store connection, and the
//! optional lexical search endpoint.
//!
//! ## Configuration File Location
//!
//! All platforms: `$HOME/.config/grounder/config.json`
//!
//! On Windows, uses `%USERPROFILE%\.config\grounder\config.json` if `$HOME`
//! is not set.
//!
//! ## API Keys
//!
//! Every block prefers an environment-variable name (`api_key_env`) over a
//! key stored in the file. `GROUNDER_ANN_URL` and `GROUNDER_ANN_KEY`
//! override the ANN block at runtime.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable overriding the ANN store URL
const ANN_URL_ENV_VAR: &str = "GROUNDER_ANN_URL";

/// Environment variable overriding the ANN store key
const ANN_KEY_ENV_VAR: &str = "GROUNDER_ANN_KEY";

/// LLM configuration for the completion provider
///
/// # Supported Providers
///
/// - `openai`: OpenAI API (GPT-4o and friends)
/// - `anthropic`: Anthropic API (Claude)
/// - `ollama`: Local Ollama instance
/// - `custom`: Custom OpenAI-compatible endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider (openai, anthropic, ollama, custom)
    pub provider: String,
    /// API endpoint URL
    pub endpoint: String,
    /// Model name (e.g., gpt-4o-mini, claude-3-5-sonnet-latest)
    pub model: String,
    /// API key stored in the config file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable name for the API key (preferred over api_key)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl LlmConfig {
    /// Create a new OpenAI configuration
    pub fn openai(model: &str) -> Self {
        Self {
            provider: "openai".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            model: model.to_string(),
            api_key: None,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
        }
    }

    /// Create a new Anthropic configuration
    pub fn anthropic(model: &str) -> Self {
        Self {
            provider: "anthropic".to_string(),
            endpoint: "https://api.anthropic.com/v1".to_string(),
            model: model.to_string(),
            api_key: None,
            api_key_env: Some("ANTHROPIC_API_KEY".to_string()),
        }
    }

    /// Create a new Ollama configuration
    pub fn ollama(endpoint: &str, model: &str) -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key: None,
            api_key_env: None,
        }
    }

    /// Create a custom OpenAI-compatible configuration
    pub fn custom(endpoint: &str, model: &str) -> Self {
        Self {
            provider: "custom".to_string(),
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key: None,
            api_key_env: None,
        }
    }

    /// Get the API key from environment or config
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(ref env_var) = self.api_key_env {
            if let Ok(key) = std::env::var(env_var) {
                return Some(key);
            }
        }
        self.api_key.clone()
    }

    /// Check if the LLM is configured and ready to use
    pub fn is_ready(&self) -> bool {
        // Ollama doesn't require an API key
        if self.provider == "ollama" {
            return true;
        }
        self.get_api_key().is_some()
    }

    /// Get a masked version of the API key for display
    pub fn masked_api_key(&self) -> Option<String> {
        self.get_api_key().map(|key| mask_key(&key))
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding provider (openai, ollama)
    pub provider: String,
    /// API endpoint URL; provider default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Model name (e.g., text-embedding-3-large, nomic-embed-text)
    pub model: String,
    /// Embedding dimensions; provider default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dims: Option<usize>,
    /// API key stored in the config file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable name for the API key (preferred over api_key)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl EmbeddingConfig {
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(ref env_var) = self.api_key_env {
            if let Ok(key) = std::env::var(env_var) {
                return Some(key);
            }
        }
        self.api_key.clone()
    }
}

/// ANN store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnSettings {
    /// Base URL of the vector-store REST API
    pub url: String,
    /// Service or anon key stored in the config file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Name of the match RPC function
    #[serde(default = "default_rpc_name")]
    pub rpc_name: String,
    /// Path to a JSON projection matrix applied to query embeddings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_path: Option<String>,
}

fn default_rpc_name() -> String {
    "match_documents".to_string()
}

impl AnnSettings {
    /// Effective URL, with `GROUNDER_ANN_URL` taking precedence.
    pub fn effective_url(&self) -> String {
        std::env::var(ANN_URL_ENV_VAR).unwrap_or_else(|_| self.url.clone())
    }

    /// Effective key, with `GROUNDER_ANN_KEY` taking precedence.
    pub fn effective_key(&self) -> Option<String> {
        std::env::var(ANN_KEY_ENV_VAR).ok().or_else(|| self.api_key.clone())
    }
}

/// Optional lexical search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalSettings {
    /// Search endpoint URL
    pub endpoint: String,
    /// Optional bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Engine tuning overrides; anything absent uses the engine default
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_loops: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_expansions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexical_k: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_context_chars: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl EngineSettings {
    /// Apply the overrides on top of the engine defaults.
    pub fn apply(&self, mut base: grounder_rag::EngineConfig) -> grounder_rag::EngineConfig {
        if let Some(v) = self.top_k {
            base.top_k = v;
        }
        if let Some(v) = self.max_loops {
            base.max_loops = v;
        }
        if let Some(v) = self.max_expansions {
            base.max_expansions = v;
        }
        if let Some(v) = self.lexical_k {
            base.lexical_k = v;
        }
        if let Some(v) = self.max_context_chars {
            base.max_context_chars = v;
        }
        if let Some(v) = self.probes {
            base.probes = v;
        }
        if let Some(v) = self.request_timeout_secs {
            base.request_timeout_secs = v;
        }
        base
    }
}

/// CLI configuration
///
/// # Example
///
/// ```rust,ignore
/// use grounder::config::{Config, LlmConfig};
///
/// let mut config = Config::default();
/// config.llm = Some(LlmConfig::openai("gpt-4o-mini"));
/// config.save().expect("Failed to save config");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Completion provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,
    /// Embedding provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<EmbeddingConfig>,
    /// ANN store connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ann: Option<AnnSettings>,
    /// Lexical search endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexical: Option<LexicalSettings>,
    /// Engine tuning overrides
    #[serde(default)]
    pub engine: EngineSettings,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load the configuration, or start from an empty one if none exists
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Save configuration to the default config file
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Check if a configuration file exists
    pub fn exists() -> bool {
        config_path().map(|p| p.exists()).unwrap_or(false)
    }
}

/// Mask a key for display: first and last four characters survive.
pub fn mask_key(key: &str) -> String {
    if key.len() > 8 {
        format!("{}...{}", &key[..4], &key[key.len() - 4..])
    } else {
        "****".to_string()
    }
}

/// Get the path to the configuration file
fn config_path() -> Result<PathBuf> {
    let config_dir = dirs_config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("grounder").join("config.json"))
}

/// Get the config directory
///
/// Uses `$HOME/.config` on all platforms for consistency.
fn dirs_config_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .or_else(|| std::env::var("USERPROFILE").ok())
                .map(|h| PathBuf::from(h).join(".config"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_config_openai_defaults() {
        let llm = LlmConfig::openai("gpt-4o-mini");
        assert_eq!(llm.provider, "openai");
        assert_eq!(llm.endpoint, "https://api.openai.com/v1");
        assert_eq!(llm.api_key_env.as_deref(), Some("OPENAI_API_KEY"));
    }

    #[test]
    fn test_ollama_is_ready_without_key() {
        let llm = LlmConfig::ollama("http://localhost:11434", "qwen3");
        assert!(llm.is_ready());
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk_live_abcdef123456"), "sk_l...3456");
        assert_eq!(mask_key("short"), "****");
    }

    #[test]
    fn test_engine_settings_apply_overrides() {
        let settings = EngineSettings {
            top_k: Some(4),
            max_loops: Some(1),
            ..Default::default()
        };
        let applied = settings.apply(grounder_rag::EngineConfig::default());
        assert_eq!(applied.top_k, 4);
        assert_eq!(applied.max_loops, 1);
        // Untouched fields keep the engine defaults.
        assert_eq!(applied.max_expansions, 3);
        assert_eq!(applied.lexical_k, 20);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let mut config = Config::default();
        config.llm = Some(LlmConfig::anthropic("claude-3-5-sonnet-latest"));
        config.ann = Some(AnnSettings {
            url: "https://store.example".to_string(),
            api_key: Some("anon".to_string()),
            rpc_name: "match_documents".to_string(),
            projection_path: None,
        });

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.llm.unwrap().provider, "anthropic");
        assert_eq!(parsed.ann.unwrap().url, "https://store.example");
    }

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let json = r#"{"ann": {"url": "https://s.example"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let ann = config.ann.unwrap();
        assert_eq!(ann.rpc_name, "match_documents");
        assert!(config.llm.is_none());
        assert!(config.engine.top_k.is_none());
    }
}
