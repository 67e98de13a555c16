use serde::{Deserialize, Serialize};

/// Metadata attached to a retrieved document.
///
/// Every field is optional because the two retrieval paths populate
/// different subsets: ANN rows carry `doc_id`/`similarity` and whatever the
/// indexer stored, while lexical rows often only have `source`. The dedup
/// key priority (`doi` -> `url` -> `source` -> `title` -> `doc_id`) lives in
/// the `dedup` module, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocMetadata {
    /// Internal document/chunk id assigned by the index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    /// Persistent cross-system identifier (DOI or similar)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    /// Canonical URL of the source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Provenance label (file path, feed name, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Cosine similarity reported by the ANN service, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    /// Associated media links, deduplicated and order-preserving
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// A retrieval unit: a passage of text plus its metadata.
///
/// Documents are immutable once created. Stages that need a modified
/// version (e.g., truncated content) build a new Document instead of
/// mutating in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: DocMetadata,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: DocMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Build a new Document with different content, carrying metadata over.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Advisory answerability classification produced by the PLAN stage.
///
/// The minimal contract treats this as a surfaced value only; a stricter
/// deployment may short-circuit on `Outside`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanVerdict {
    /// The question should be answerable from the indexed corpus
    #[default]
    Corpus,
    /// The question likely needs out-of-corpus handling
    Outside,
}

/// The unit of work for one conversational turn.
///
/// Created fresh per turn, owned by the orchestration controller, and moved
/// by value through the pipeline stages; each stage returns a new state
/// rather than mutating shared data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Immutable original question
    pub question: String,
    /// Advisory PLAN classification
    #[serde(default)]
    pub plan: PlanVerdict,
    /// Expanded search queries; always starts with the original question
    #[serde(default)]
    pub queries: Vec<String>,
    /// Fused candidate documents from the latest RETRIEVE pass
    #[serde(default)]
    pub docs: Vec<Document>,
    /// Subset of `docs` judged relevant by GRADE
    #[serde(default)]
    pub graded_docs: Vec<Document>,
    /// Current draft answer
    #[serde(default)]
    pub draft: String,
    /// Completed refinement loops; never exceeds the configured maximum
    #[serde(default)]
    pub loop_count: u32,
}

impl SessionState {
    /// Fresh state for a new turn.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }
}
