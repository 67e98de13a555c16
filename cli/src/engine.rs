//! Wires the configuration file into a ready-to-run [`TurnEngine`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use grounder_rag::ann::{AnnConfig, AnnRetriever};
use grounder_rag::checkpoint::MemoryCheckpoint;
use grounder_rag::completion::{CompletionClient, CompletionConfig};
use grounder_rag::embeddings::{EmbeddingProvider, OllamaEmbeddings, OpenAiEmbeddings};
use grounder_rag::lexical::{HttpLexicalIndex, LexicalConfig, LexicalSearch};
use grounder_rag::projection::{ProjectionMatrix, QueryEmbedder};
use grounder_rag::retrieval::RetrievalCoordinator;
use grounder_rag::{EngineConfig, TurnEngine};

use crate::config::Config;

/// Per-invocation tuning from command-line flags.
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineOverrides {
    pub max_loops: Option<u32>,
    pub top_k: Option<usize>,
}

/// Build the turn engine from the loaded configuration.
///
/// Fails with a configuration error when a required block (LLM, embedding,
/// ANN) is missing or lacks credentials; the lexical block stays optional.
pub fn build_engine(config: &Config, overrides: EngineOverrides) -> Result<TurnEngine> {
    let mut engine_config = config.engine.apply(EngineConfig::default());
    if let Some(loops) = overrides.max_loops {
        engine_config.max_loops = loops;
    }
    if let Some(top_k) = overrides.top_k {
        engine_config.top_k = top_k;
    }
    let timeout = Duration::from_secs(engine_config.request_timeout_secs);

    let llm = build_completion(config, timeout)?;
    let embedder = build_embedder(config, timeout)?;
    let ann = build_ann(config, &engine_config, embedder, timeout)?;
    let lexical = build_lexical(config, &engine_config, timeout);

    let retriever = RetrievalCoordinator::new(ann, lexical, engine_config.clone());

    Ok(
        TurnEngine::new(llm, Arc::new(retriever), engine_config)
            .with_checkpoint(Arc::new(MemoryCheckpoint::new())),
    )
}

fn build_completion(config: &Config, timeout: Duration) -> Result<Arc<CompletionClient>> {
    let llm = config
        .llm
        .as_ref()
        .context("No LLM configured. Run `grounder config set-llm` first.")?;

    let completion_config = CompletionConfig {
        provider: llm.provider.clone(),
        endpoint: llm.endpoint.clone(),
        model: llm.model.clone(),
        api_key: llm.get_api_key(),
        timeout,
    };
    let client = CompletionClient::new(&completion_config)
        .context("Completion provider is not usable")?;
    Ok(Arc::new(client))
}

fn build_embedder(config: &Config, timeout: Duration) -> Result<QueryEmbedder> {
    let embedding = config
        .embedding
        .as_ref()
        .context("No embedding provider configured. Run `grounder config set-embedding` first.")?;

    let provider: Arc<dyn EmbeddingProvider> = match embedding.provider.as_str() {
        "openai" => {
            let api_key = embedding
                .get_api_key()
                .context("Embedding provider requires an API key")?;
            Arc::new(OpenAiEmbeddings::new(
                api_key,
                embedding.model.clone(),
                embedding.endpoint.clone(),
                embedding.dims,
                timeout,
            ))
        }
        "ollama" => Arc::new(OllamaEmbeddings::new(
            embedding.model.clone(),
            embedding.endpoint.clone(),
            embedding.dims,
            timeout,
        )),
        other => bail!("Unsupported embedding provider: {other}"),
    };

    let projection = match config.ann.as_ref().and_then(|a| a.projection_path.as_ref()) {
        Some(path) => {
            let matrix = ProjectionMatrix::from_file(path)
                .with_context(|| format!("Failed to load projection matrix from {path}"))?;
            log::debug!(
                "loaded projection matrix {}x{}",
                matrix.input_dim(),
                matrix.output_dim()
            );
            Some(Arc::new(matrix))
        }
        None => None,
    };

    Ok(QueryEmbedder::new(provider, projection))
}

fn build_ann(
    config: &Config,
    engine_config: &EngineConfig,
    embedder: QueryEmbedder,
    timeout: Duration,
) -> Result<Arc<AnnRetriever>> {
    let ann = config
        .ann
        .as_ref()
        .context("No ANN store configured. Run `grounder config set-ann` first.")?;
    let api_key = ann
        .effective_key()
        .context("ANN store requires a key (config or GROUNDER_ANN_KEY)")?;

    let ann_config = AnnConfig {
        base_url: ann.effective_url(),
        api_key,
        rpc_name: ann.rpc_name.clone(),
        top_k: engine_config.top_k,
        probes: engine_config.probes,
        oversample: engine_config.oversample,
        timeout,
    };
    Ok(Arc::new(AnnRetriever::new(ann_config, embedder)))
}

fn build_lexical(
    config: &Config,
    engine_config: &EngineConfig,
    timeout: Duration,
) -> Option<Arc<dyn LexicalSearch>> {
    config.lexical.as_ref().map(|lexical| {
        let lexical_config = LexicalConfig {
            endpoint: lexical.endpoint.clone(),
            api_key: lexical.api_key.clone(),
            limit: engine_config.lexical_k,
            timeout,
        };
        Arc::new(HttpLexicalIndex::new(lexical_config)) as Arc<dyn LexicalSearch>
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnnSettings, EmbeddingConfig, LlmConfig};

    fn full_config() -> Config {
        Config {
            llm: Some(LlmConfig::ollama("http://localhost:11434", "qwen3")),
            embedding: Some(EmbeddingConfig {
                provider: "ollama".to_string(),
                endpoint: None,
                model: "nomic-embed-text".to_string(),
                dims: None,
                api_key: None,
                api_key_env: None,
            }),
            ann: Some(AnnSettings {
                url: "https://store.example".to_string(),
                api_key: Some("anon".to_string()),
                rpc_name: "match_documents".to_string(),
                projection_path: None,
            }),
            lexical: None,
            engine: Default::default(),
        }
    }

    #[test]
    fn test_full_config_builds_an_engine() {
        let engine = build_engine(&full_config(), EngineOverrides::default()).unwrap();
        assert_eq!(engine.config().top_k, 8);
    }

    #[test]
    fn test_flag_overrides_win_over_file_settings() {
        let overrides = EngineOverrides {
            max_loops: Some(0),
            top_k: Some(3),
        };
        let engine = build_engine(&full_config(), overrides).unwrap();
        assert_eq!(engine.config().max_loops, 0);
        assert_eq!(engine.config().top_k, 3);
    }

    #[test]
    fn test_missing_llm_block_is_a_config_error() {
        let mut config = full_config();
        config.llm = None;
        assert!(build_engine(&config, EngineOverrides::default()).is_err());
    }

    #[test]
    fn test_missing_ann_block_is_a_config_error() {
        let mut config = full_config();
        config.ann = None;
        assert!(build_engine(&config, EngineOverrides::default()).is_err());
    }
}
