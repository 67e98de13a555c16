//! Chunk-to-article deduplication for the vector-search path.
//!
//! The ANN index stores chunk-level rows, so a single source document can
//! occupy several of the top hits. Before fusion those hits are collapsed
//! to one Document per source, keeping the best-scoring chunk. The grouping
//! key here is metadata-based on purpose: chunks of the same article have
//! *different* content, so the content-prefix key used by rank fusion
//! cannot collapse them.

use std::collections::HashMap;

use crate::types::Document;

/// Stable grouping key, first non-empty wins:
/// DOI -> canonical URL -> source label -> title -> internal id.
///
/// Returns `None` when no identity field is present; all such documents
/// fall into one group.
pub fn identity_key(doc: &Document) -> Option<String> {
    let md = &doc.metadata;
    [&md.doi, &md.url, &md.source, &md.title, &md.doc_id]
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
        .cloned()
}

fn similarity(doc: &Document) -> f32 {
    doc.metadata.similarity.unwrap_or(0.0)
}

/// Collapse chunk-level hits into unique article-level hits.
///
/// Per group the highest-similarity Document is retained (missing score
/// counts as 0). Output is sorted by similarity descending and truncated
/// to `top_k`.
pub fn dedup_best(docs: Vec<Document>, top_k: usize) -> Vec<Document> {
    let mut best: HashMap<Option<String>, Document> = HashMap::new();
    for doc in docs {
        let key = identity_key(&doc);
        match best.get(&key) {
            Some(prev) if similarity(prev) >= similarity(&doc) => {}
            _ => {
                best.insert(key, doc);
            }
        }
    }

    let mut unique: Vec<Document> = best.into_values().collect();
    unique.sort_by(|a, b| {
        similarity(b)
            .partial_cmp(&similarity(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    unique.truncate(top_k);
    unique
}
