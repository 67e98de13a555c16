//! ANN (approximate-nearest-neighbor) retrieval over a pgvector RPC
//! endpoint.
//!
//! The index stores chunk-level rows, so the retriever oversamples the
//! requested `top_k` and collapses the hits to article level with
//! [`dedup_best`] before handing them to fusion. Row metadata is whatever
//! the indexer stored: sometimes a JSON object, sometimes a JSON-encoded
//! string, with image links in several shapes. Parsing here is tolerant by
//! design; a row we cannot fully understand still yields a Document with
//! whatever fields were recoverable.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::dedup::dedup_best;
use crate::error::EngineError;
use crate::projection::QueryEmbedder;
use crate::types::{DocMetadata, Document};

const SERVICE: &str = "ann";

/// Dense-vector search boundary, mockable in tests.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Retrieve article-level candidates for one query.
    async fn search(&self, query: &str) -> Result<Vec<Document>, EngineError>;
}

/// Connection settings for [`AnnRetriever`].
#[derive(Debug, Clone)]
pub struct AnnConfig {
    /// Base URL of the vector-store REST API
    pub base_url: String,
    /// Service or anon key, sent as both `apikey` and bearer token
    pub api_key: String,
    /// Name of the match RPC function (e.g., "match_documents")
    pub rpc_name: String,
    /// Article-level results per query
    pub top_k: usize,
    /// Index-side probe count
    pub probes: u32,
    /// Chunk oversampling factor for dedup
    pub oversample: usize,
    /// Per-call deadline
    pub timeout: Duration,
}

#[derive(Serialize)]
struct MatchPayload {
    query_embedding: Vec<f32>,
    match_count: usize,
    probes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

/// ANN retriever: embed (with optional projection), RPC, parse, dedup.
pub struct AnnRetriever {
    client: reqwest::Client,
    config: AnnConfig,
    embedder: QueryEmbedder,
}

impl AnnRetriever {
    pub fn new(config: AnnConfig, embedder: QueryEmbedder) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .unwrap_or_default(),
            config,
            embedder,
        }
    }

    fn match_count(&self) -> usize {
        oversampled_count(self.config.top_k, self.config.oversample)
    }

    async fn rpc(&self, embedding: Vec<f32>) -> Result<Vec<Value>, EngineError> {
        let url = format!(
            "{}/rest/v1/rpc/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.rpc_name
        );
        let payload = MatchPayload {
            query_embedding: embedding,
            match_count: self.match_count(),
            probes: self.config.probes,
            filter: None,
        };

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| EngineError::from_reqwest(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Unavailable {
                service: SERVICE.to_string(),
                message: format!("RPC error {status}: {body}"),
            });
        }

        let rows: Value = response
            .json()
            .await
            .map_err(|e| EngineError::from_reqwest(SERVICE, e))?;
        match rows {
            Value::Array(rows) => Ok(rows),
            other => Err(EngineError::Malformed {
                service: SERVICE.to_string(),
                message: format!("expected a row array, got {other}"),
            }),
        }
    }
}

#[async_trait]
impl VectorSearch for AnnRetriever {
    async fn search(&self, query: &str) -> Result<Vec<Document>, EngineError> {
        let embedding = self.embedder.embed(query).await?;
        let rows = self.rpc(embedding).await?;
        let docs: Vec<Document> = rows.iter().map(row_to_document).collect();
        log::debug!(
            "ann query returned {} chunk hits, deduping to {}",
            docs.len(),
            self.config.top_k
        );
        Ok(dedup_best(docs, self.config.top_k))
    }
}

/// Chunk count requested from the index: oversampled for dedup, but never
/// below `top_k` and capped at 100.
fn oversampled_count(top_k: usize, oversample: usize) -> usize {
    (top_k * oversample).max(top_k).min(100)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalize an images value into deduplicated URLs.
///
/// Accepts a list of strings, or a list of objects carrying `src` or `url`.
fn normalize_images(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let link = match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(_) => string_field(item, "src").or_else(|| string_field(item, "url")),
            _ => None,
        };
        if let Some(link) = link.filter(|l| !l.is_empty()) {
            if seen.insert(link.clone()) {
                out.push(link);
            }
        }
    }
    out
}

/// Parse one RPC row into a Document.
///
/// `metadata` may be a JSON object or a JSON-encoded string; images may
/// live at the top level or nested under `scrape`; the URL falls back
/// through `url` -> `source` -> `link` -> the row's own `url` column.
fn row_to_document(row: &Value) -> Document {
    let raw_md = row.get("metadata");
    let md_obj: Value = match raw_md {
        Some(Value::Object(_)) => raw_md.cloned().unwrap_or(Value::Null),
        Some(Value::String(s)) => serde_json::from_str(s).unwrap_or(Value::Null),
        _ => Value::Null,
    };

    let mut images = normalize_images(md_obj.get("images"));
    if images.is_empty() {
        images = normalize_images(md_obj.get("scrape").and_then(|s| s.get("images")));
    }

    let url = string_field(&md_obj, "url")
        .or_else(|| string_field(&md_obj, "source"))
        .or_else(|| string_field(&md_obj, "link"))
        .or_else(|| string_field(row, "url"));

    let doc_id = row
        .get("doc_id")
        .or_else(|| row.get("id"))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .filter(|s| !s.is_empty() && s != "null");

    let metadata = DocMetadata {
        doc_id,
        doi: string_field(&md_obj, "doi"),
        url,
        source: string_field(&md_obj, "source"),
        title: string_field(&md_obj, "title"),
        similarity: row.get("similarity").and_then(Value::as_f64).map(|s| s as f32),
        images,
    };

    let content = row
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Document::new(content, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_with_object_metadata() {
        let row = json!({
            "content": "cells divide by mitosis",
            "similarity": 0.87,
            "doc_id": "chunk-12",
            "metadata": {
                "title": "Cell Division",
                "url": "https://example.org/mitosis",
                "doi": "10.1000/demo",
                "images": ["https://example.org/fig1.png"]
            }
        });
        let doc = row_to_document(&row);
        assert_eq!(doc.content, "cells divide by mitosis");
        assert_eq!(doc.metadata.title.as_deref(), Some("Cell Division"));
        assert_eq!(doc.metadata.doi.as_deref(), Some("10.1000/demo"));
        assert_eq!(doc.metadata.similarity, Some(0.87));
        assert_eq!(doc.metadata.doc_id.as_deref(), Some("chunk-12"));
        assert_eq!(doc.metadata.images, vec!["https://example.org/fig1.png"]);
    }

    #[test]
    fn test_row_with_string_metadata() {
        let row = json!({
            "content": "text",
            "id": 42,
            "metadata": "{\"title\": \"Stored As String\", \"source\": \"crawler\"}"
        });
        let doc = row_to_document(&row);
        assert_eq!(doc.metadata.title.as_deref(), Some("Stored As String"));
        assert_eq!(doc.metadata.source.as_deref(), Some("crawler"));
        assert_eq!(doc.metadata.doc_id.as_deref(), Some("42"));
        // url falls back to source when no url/link is present
        assert_eq!(doc.metadata.url.as_deref(), Some("crawler"));
    }

    #[test]
    fn test_row_with_garbage_metadata_still_yields_document() {
        let row = json!({
            "content": "survivor",
            "url": "https://row-level.example",
            "metadata": "not json at all"
        });
        let doc = row_to_document(&row);
        assert_eq!(doc.content, "survivor");
        assert_eq!(doc.metadata.url.as_deref(), Some("https://row-level.example"));
        assert!(doc.metadata.title.is_none());
    }

    #[test]
    fn test_images_as_objects_and_nested_scrape() {
        let row = json!({
            "content": "c",
            "metadata": {
                "scrape": {
                    "images": [
                        {"src": "https://a/1.png"},
                        {"url": "https://a/2.png"},
                        {"src": "https://a/1.png"},
                        {"alt": "no link"}
                    ]
                }
            }
        });
        let doc = row_to_document(&row);
        assert_eq!(doc.metadata.images, vec!["https://a/1.png", "https://a/2.png"]);
    }

    #[test]
    fn test_oversampled_count_clamps() {
        assert_eq!(oversampled_count(8, 6), 48);
        assert_eq!(oversampled_count(30, 6), 100);
        assert_eq!(oversampled_count(8, 0), 8);
    }
}
