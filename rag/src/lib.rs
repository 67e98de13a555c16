//! Agentic retrieval engine: plan, expand, retrieve, grade, generate,
//! verify.
//!
//! The engine turns a single user question into a grounded answer by
//! driving a bounded state machine over external services:
//!
//! - [`pipeline::TurnEngine`] owns the stage loop and the refinement
//!   budget.
//! - [`retrieval::RetrievalCoordinator`] fans expanded queries out to an
//!   ANN service ([`ann::AnnRetriever`]) and an optional lexical index
//!   ([`lexical::HttpLexicalIndex`]), then rank-fuses the pools
//!   ([`fusion::fuse`]).
//! - [`projection::QueryEmbedder`] normalizes raw embeddings and applies
//!   an optional dimension-reduction matrix before search.
//! - [`completion::CompletionClient`] speaks to OpenAI-, Anthropic- and
//!   Ollama-style chat endpoints behind one trait.
//!
//! ```ignore
//! use grounder_rag::completion::{CompletionClient, CompletionConfig};
//! use grounder_rag::config::EngineConfig;
//! use grounder_rag::pipeline::TurnEngine;
//!
//! let llm = Arc::new(CompletionClient::new(completion_config)?);
//! let engine = TurnEngine::new(llm, retriever, EngineConfig::default());
//! let state = engine.run_turn("What does the paper conclude?", "thread-1").await?;
//! println!("{}", state.draft);
//! ```

pub mod ann;
pub mod checkpoint;
pub mod completion;
pub mod config;
pub mod dedup;
pub mod embeddings;
pub mod error;
pub mod fusion;
pub mod lexical;
pub mod pipeline;
pub mod projection;
pub mod retrieval;
pub mod sanitize;
pub mod types;

pub use config::EngineConfig;
pub use error::EngineError;
pub use pipeline::TurnEngine;
pub use types::{DocMetadata, Document, SessionState};
