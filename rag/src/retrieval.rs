//! Retrieval coordinator: fan expanded queries out to the vector and
//! lexical paths, fuse the pools, and bound the output for downstream
//! prompt building.
//!
//! The two calls for a single query run concurrently; queries themselves
//! are joined in order because rank fusion scores by position, so the
//! relative order of queries inside each pool must be stable. A failed
//! call contributes an empty slice instead of aborting the turn.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::ann::VectorSearch;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fusion::{fuse, FusionWeights};
use crate::lexical::LexicalSearch;
use crate::types::Document;

/// Marker appended when a document is hard-truncated to the context budget.
pub const TRUNCATION_MARKER: &str = "\n\n[truncated]";

/// Candidate retrieval boundary used by the orchestration controller.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve a fused, deduplicated, size-bounded candidate list for a
    /// set of expanded queries.
    async fn retrieve(&self, queries: &[String]) -> Result<Vec<Document>, EngineError>;
}

/// Hard character-budget truncation with a trailing marker.
///
/// This is a correctness-preserving cut, not summarization: the first
/// `max_chars` characters survive verbatim.
pub fn compress_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

/// Fans queries out to both search paths and fuses the pooled results.
pub struct RetrievalCoordinator {
    vector: Arc<dyn VectorSearch>,
    lexical: Option<Arc<dyn LexicalSearch>>,
    config: EngineConfig,
}

impl RetrievalCoordinator {
    pub fn new(
        vector: Arc<dyn VectorSearch>,
        lexical: Option<Arc<dyn LexicalSearch>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            vector,
            lexical,
            config,
        }
    }
}

#[async_trait]
impl Retriever for RetrievalCoordinator {
    async fn retrieve(&self, queries: &[String]) -> Result<Vec<Document>, EngineError> {
        let per_query = queries.iter().map(|q| {
            let vector = Arc::clone(&self.vector);
            let lexical = self.lexical.clone();
            async move {
                let vec_hits = async {
                    match vector.search(q).await {
                        Ok(docs) => docs,
                        Err(e) => {
                            log::warn!("vector search failed for {q:?}: {e}");
                            Vec::new()
                        }
                    }
                };
                let lex_hits = async {
                    match &lexical {
                        Some(index) => match index.query(q).await {
                            Ok(docs) => docs,
                            Err(e) => {
                                log::warn!("lexical search failed for {q:?}: {e}");
                                Vec::new()
                            }
                        },
                        None => Vec::new(),
                    }
                };
                tokio::join!(vec_hits, lex_hits)
            }
        });

        // join_all preserves query order; only the two calls within one
        // query run unordered.
        let results = join_all(per_query).await;

        let mut vector_pool = Vec::new();
        let mut lexical_pool = Vec::new();
        for (vec_hits, lex_hits) in results {
            vector_pool.extend(vec_hits);
            lexical_pool.extend(lex_hits);
        }

        let weights = FusionWeights {
            primary: self.config.vector_weight,
            secondary: self.config.lexical_weight,
        };
        let fused = fuse(&vector_pool, &lexical_pool, self.config.top_k, weights);

        Ok(fused
            .into_iter()
            .map(|d| {
                let compressed = compress_text(&d.content, self.config.max_context_chars);
                d.with_content(compressed)
            })
            .collect())
    }
}
