//! # Config Command
//!
//! Manages the CLI configuration file: completion provider, embedding
//! provider, ANN store, and the optional lexical endpoint.
//!
//! ## Usage
//!
//! ```bash
//! # Show current configuration
//! grounder config show
//!
//! # Configure the completion provider
//! grounder config set-llm openai --model gpt-4o-mini
//! grounder config set-llm anthropic --model claude-3-5-sonnet-latest
//! grounder config set-llm ollama --endpoint http://localhost:11434 --model qwen3
//!
//! # Configure the embedding provider
//! grounder config set-embedding openai --model text-embedding-3-large --dims 3072
//!
//! # Configure the ANN store
//! grounder config set-ann --url https://xyz.supabase.co --key-env SUPABASE_KEY
//!
//! # Configure the optional lexical endpoint
//! grounder config set-lexical --endpoint https://search.example/query
//! ```

use anyhow::Result;
use colored::Colorize;

use crate::config::{
    mask_key, AnnSettings, Config, EmbeddingConfig, LexicalSettings, LlmConfig,
};
use crate::errors::display_success;
use crate::exit_codes::*;

/// Completion provider choices for `config set-llm`
#[derive(Debug, Clone)]
pub enum LlmProvider {
    OpenAi {
        model: String,
        api_key: Option<String>,
    },
    Anthropic {
        model: String,
        api_key: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
    },
    Custom {
        endpoint: String,
        model: String,
        api_key: Option<String>,
    },
}

/// Arguments for `config set-embedding`
#[derive(Debug)]
pub struct SetEmbeddingArgs {
    pub provider: String,
    pub model: String,
    pub endpoint: Option<String>,
    pub dims: Option<usize>,
    pub api_key_env: Option<String>,
}

/// Arguments for `config set-ann`
#[derive(Debug)]
pub struct SetAnnArgs {
    pub url: String,
    pub key: Option<String>,
    pub rpc_name: Option<String>,
    pub projection: Option<String>,
}

/// Arguments for `config set-lexical`
#[derive(Debug)]
pub struct SetLexicalArgs {
    pub endpoint: String,
    pub key: Option<String>,
}

/// Execute `config show`
pub fn execute_show() -> Result<i32> {
    let config = Config::load_or_default();

    println!();
    println!("{}", "Grounder Configuration".bold().underline());
    println!();

    println!("{}", "Completion".cyan().bold());
    match &config.llm {
        Some(llm) => {
            println!("  {} {}", "Provider:".dimmed(), llm.provider);
            println!("  {} {}", "Endpoint:".dimmed(), llm.endpoint);
            println!("  {} {}", "Model:".dimmed(), llm.model);
            if let Some(ref env_var) = llm.api_key_env {
                let status = if std::env::var(env_var).is_ok() {
                    "✓ set".green().to_string()
                } else {
                    "✗ not set".red().to_string()
                };
                println!("  {} {} ({})", "API Key Env:".dimmed(), env_var, status);
            }
            if let Some(masked) = llm.masked_api_key() {
                println!("  {} {}", "API Key:".dimmed(), masked);
            }
            let ready = if llm.is_ready() {
                "✓ ready".green()
            } else {
                "✗ not ready (API key missing)".red()
            };
            println!("  {} {}", "Status:".dimmed(), ready);
        }
        None => println!("  {}", "Not configured".dimmed()),
    }
    println!();

    println!("{}", "Embedding".cyan().bold());
    match &config.embedding {
        Some(embedding) => {
            println!("  {} {}", "Provider:".dimmed(), embedding.provider);
            println!("  {} {}", "Model:".dimmed(), embedding.model);
            if let Some(ref endpoint) = embedding.endpoint {
                println!("  {} {}", "Endpoint:".dimmed(), endpoint);
            }
            if let Some(dims) = embedding.dims {
                println!("  {} {}", "Dimensions:".dimmed(), dims);
            }
        }
        None => println!("  {}", "Not configured".dimmed()),
    }
    println!();

    println!("{}", "ANN store".cyan().bold());
    match &config.ann {
        Some(ann) => {
            println!("  {} {}", "URL:".dimmed(), ann.effective_url());
            println!("  {} {}", "RPC:".dimmed(), ann.rpc_name);
            match ann.effective_key() {
                Some(key) => println!("  {} {}", "Key:".dimmed(), mask_key(&key)),
                None => println!("  {} {}", "Key:".dimmed(), "✗ not set".red()),
            }
            if let Some(ref path) = ann.projection_path {
                println!("  {} {}", "Projection:".dimmed(), path);
            }
        }
        None => println!("  {}", "Not configured".dimmed()),
    }
    println!();

    println!("{}", "Lexical search".cyan().bold());
    match &config.lexical {
        Some(lexical) => println!("  {} {}", "Endpoint:".dimmed(), lexical.endpoint),
        None => println!("  {}", "Not configured (vector-only retrieval)".dimmed()),
    }
    println!();

    Ok(EXIT_SUCCESS)
}

/// Execute `config set-llm`
pub fn execute_set_llm(provider: LlmProvider) -> Result<i32> {
    let mut config = Config::load_or_default();

    let llm = match provider {
        LlmProvider::OpenAi { model, api_key } => {
            let mut llm = LlmConfig::openai(&model);
            llm.api_key = api_key;
            llm
        }
        LlmProvider::Anthropic { model, api_key } => {
            let mut llm = LlmConfig::anthropic(&model);
            llm.api_key = api_key;
            llm
        }
        LlmProvider::Ollama { endpoint, model } => LlmConfig::ollama(&endpoint, &model),
        LlmProvider::Custom {
            endpoint,
            model,
            api_key,
        } => {
            let mut llm = LlmConfig::custom(&endpoint, &model);
            llm.api_key = api_key;
            llm
        }
    };

    let summary = format!("{} / {}", llm.provider, llm.model);
    config.llm = Some(llm);
    config.save()?;
    display_success(&format!("Completion provider set: {summary}"));
    Ok(EXIT_SUCCESS)
}

/// Execute `config set-embedding`
pub fn execute_set_embedding(args: SetEmbeddingArgs) -> Result<i32> {
    if args.provider != "openai" && args.provider != "ollama" {
        eprintln!(
            "{} Unsupported embedding provider: {} (expected openai or ollama)",
            "Error:".red().bold(),
            args.provider
        );
        return Ok(EXIT_INVALID_INPUT);
    }

    let mut config = Config::load_or_default();
    let api_key_env = args.api_key_env.or_else(|| {
        (args.provider == "openai").then(|| "OPENAI_API_KEY".to_string())
    });
    config.embedding = Some(EmbeddingConfig {
        provider: args.provider.clone(),
        endpoint: args.endpoint,
        model: args.model.clone(),
        dims: args.dims,
        api_key: None,
        api_key_env,
    });
    config.save()?;
    display_success(&format!(
        "Embedding provider set: {} / {}",
        args.provider, args.model
    ));
    Ok(EXIT_SUCCESS)
}

/// Execute `config set-ann`
pub fn execute_set_ann(args: SetAnnArgs) -> Result<i32> {
    let mut config = Config::load_or_default();
    config.ann = Some(AnnSettings {
        url: args.url.clone(),
        api_key: args.key,
        rpc_name: args
            .rpc_name
            .unwrap_or_else(|| "match_documents".to_string()),
        projection_path: args.projection,
    });
    config.save()?;
    display_success(&format!("ANN store set: {}", args.url));
    Ok(EXIT_SUCCESS)
}

/// Execute `config set-lexical`
pub fn execute_set_lexical(args: SetLexicalArgs) -> Result<i32> {
    let mut config = Config::load_or_default();
    config.lexical = Some(LexicalSettings {
        endpoint: args.endpoint.clone(),
        api_key: args.key,
    });
    config.save()?;
    display_success(&format!("Lexical endpoint set: {}", args.endpoint));
    Ok(EXIT_SUCCESS)
}
