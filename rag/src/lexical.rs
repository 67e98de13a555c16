//! Lexical (keyword) search boundary.
//!
//! Scoring is the index's business; this module only defines the seam and
//! an HTTP implementation that posts a query and parses ranked
//! `{content, metadata}` rows.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{DocMetadata, Document};

const SERVICE: &str = "lexical";

/// Ranked keyword search over the corpus.
#[async_trait]
pub trait LexicalSearch: Send + Sync {
    /// Retrieve ranked candidates for one query.
    async fn query(&self, text: &str) -> Result<Vec<Document>, EngineError>;
}

/// Connection settings for [`HttpLexicalIndex`].
#[derive(Debug, Clone)]
pub struct LexicalConfig {
    /// Search endpoint URL
    pub endpoint: String,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Results per query
    pub limit: usize,
    /// Per-call deadline
    pub timeout: Duration,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
}

#[derive(Deserialize)]
struct SearchRow {
    content: String,
    #[serde(default)]
    metadata: DocMetadata,
}

/// HTTP-backed lexical index client.
pub struct HttpLexicalIndex {
    client: reqwest::Client,
    config: LexicalConfig,
}

impl HttpLexicalIndex {
    pub fn new(config: LexicalConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .unwrap_or_default(),
            config,
        }
    }
}

#[async_trait]
impl LexicalSearch for HttpLexicalIndex {
    async fn query(&self, text: &str) -> Result<Vec<Document>, EngineError> {
        let request = SearchRequest {
            query: text,
            limit: self.config.limit,
        };

        let mut builder = self.client.post(&self.config.endpoint).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        let response = builder
            .send()
            .await
            .map_err(|e| EngineError::from_reqwest(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Unavailable {
                service: SERVICE.to_string(),
                message: format!("search error {status}: {body}"),
            });
        }

        let rows: Vec<SearchRow> = response
            .json()
            .await
            .map_err(|e| EngineError::from_reqwest(SERVICE, e))?;
        Ok(rows
            .into_iter()
            .map(|r| Document::new(r.content, r.metadata))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_deserializes_without_metadata() {
        let rows: Vec<SearchRow> =
            serde_json::from_str(r#"[{"content": "bare row"}]"#).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].content, "bare row");
        assert_eq!(rows[0].metadata, DocMetadata::default());
    }

    #[test]
    fn test_row_deserializes_with_metadata() {
        let rows: Vec<SearchRow> = serde_json::from_str(
            r#"[{"content": "c", "metadata": {"title": "T", "source": "s"}}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].metadata.title.as_deref(), Some("T"));
        assert_eq!(rows[0].metadata.source.as_deref(), Some("s"));
    }
}
