//! Embedding providers for turning query text into vectors.
//!
//! Supports OpenAI-compatible APIs and Ollama for embedding generation.

mod provider;

pub use provider::{EmbeddingProvider, OllamaEmbeddings, OpenAiEmbeddings};
