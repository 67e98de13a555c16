//! Reciprocal Rank Fusion over heterogeneous candidate pools.
//!
//! Dense-vector similarity and lexical scores live on incomparable scales,
//! so the pools are merged by rank only: each document at 1-based rank `r`
//! in a pool contributes `weight / (60 + r)` to its running score. The
//! smoothing constant 60 is the standard value from Cormack, Clarke &
//! Buettcher (SIGIR 2009).

use std::collections::HashMap;

use crate::types::Document;

/// RRF smoothing constant.
pub const RRF_K: f64 = 60.0;

/// Per-pool weights for [`fuse`].
#[derive(Debug, Clone, Copy)]
pub struct FusionWeights {
    /// Weight for the primary (dense-vector) pool
    pub primary: f64,
    /// Weight for the secondary (lexical) pool
    pub secondary: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            primary: 1.0,
            secondary: 0.8,
        }
    }
}

/// Internal fusion record: one entry per identity key, discarded after the
/// output sequence is produced.
struct RankEntry {
    score: f64,
    /// Position of the first sighting, for stable tie-breaking
    order: usize,
    /// First Document instance observed for this key
    doc: Document,
}

/// Coarse content-identity key: the first 200 characters of content plus
/// the source label.
///
/// This is deliberately cheap and distinct from the metadata-priority key
/// used by chunk-to-article dedup: here two hits are "the same result" when
/// they carry the same text, even if they arrived from different pools.
pub fn content_key(doc: &Document) -> String {
    let prefix: String = doc.content.chars().take(200).collect();
    let source = doc.metadata.source.as_deref().unwrap_or("");
    format!("{prefix}{source}").trim().to_string()
}

/// Fuse two ranked pools into at most `k` documents.
///
/// Output is sorted by descending fused score; ties keep first-seen order.
/// Either pool (or both) may be empty, in which case fusion degenerates to
/// ranking whatever is present.
pub fn fuse(
    primary: &[Document],
    secondary: &[Document],
    k: usize,
    weights: FusionWeights,
) -> Vec<Document> {
    let mut entries: Vec<RankEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let mut accumulate = |pool: &[Document], weight: f64| {
        for (rank, doc) in pool.iter().enumerate() {
            let key = content_key(doc);
            let contribution = weight / (RRF_K + (rank + 1) as f64);
            match index.get(&key) {
                Some(&i) => entries[i].score += contribution,
                None => {
                    index.insert(key, entries.len());
                    entries.push(RankEntry {
                        score: contribution,
                        order: entries.len(),
                        doc: doc.clone(),
                    });
                }
            }
        }
    };

    accumulate(primary, weights.primary);
    accumulate(secondary, weights.secondary);

    entries.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.order.cmp(&b.order))
    });

    entries.into_iter().take(k).map(|e| e.doc).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocMetadata;

    fn doc(content: &str, source: &str) -> Document {
        Document::new(
            content,
            DocMetadata {
                source: Some(source.to_string()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_fuse_both_empty() {
        let fused = fuse(&[], &[], 8, FusionWeights::default());
        assert!(fused.is_empty());
    }

    #[test]
    fn test_fuse_single_pool_preserves_order() {
        let primary = vec![doc("alpha", "a"), doc("beta", "a"), doc("gamma", "a")];
        let fused = fuse(&primary, &[], 8, FusionWeights::default());
        assert_eq!(fused.len(), 3);
        assert_eq!(fused[0].content, "alpha");
        assert_eq!(fused[1].content, "beta");
        assert_eq!(fused[2].content, "gamma");
    }

    #[test]
    fn test_fuse_respects_k() {
        let primary: Vec<Document> = (0..10).map(|i| doc(&format!("doc {i}"), "s")).collect();
        let fused = fuse(&primary, &[], 4, FusionWeights::default());
        assert_eq!(fused.len(), 4);
    }

    #[test]
    fn test_overlap_ranks_highest() {
        // "shared" appears in both pools, so it collects two contributions.
        let primary = vec![doc("only vector", "v"), doc("shared", "s")];
        let secondary = vec![doc("shared", "s"), doc("only lexical", "l")];
        let fused = fuse(&primary, &secondary, 8, FusionWeights::default());
        assert_eq!(fused[0].content, "shared");
        assert_eq!(fused.len(), 3);
    }

    #[test]
    fn test_secondary_weight_discounts() {
        // Same rank in each pool: the primary hit must win under 1.0 vs 0.8.
        let primary = vec![doc("vector top", "v")];
        let secondary = vec![doc("lexical top", "l")];
        let fused = fuse(&primary, &secondary, 8, FusionWeights::default());
        assert_eq!(fused[0].content, "vector top");
        assert_eq!(fused[1].content, "lexical top");
    }

    #[test]
    fn test_first_seen_document_is_retained() {
        // Identical key from both pools, but different metadata: the output
        // must carry the first-seen instance (the primary one).
        let mut first = doc("same passage", "src");
        first.metadata.title = Some("from vector".to_string());
        let mut second = doc("same passage", "src");
        second.metadata.title = Some("from lexical".to_string());

        let fused = fuse(
            std::slice::from_ref(&first),
            std::slice::from_ref(&second),
            8,
            FusionWeights::default(),
        );
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].metadata.title.as_deref(), Some("from vector"));
    }

    #[test]
    fn test_key_uses_content_prefix_and_source() {
        let a = doc("identical words", "feed-a");
        let b = doc("identical words", "feed-b");
        // Different source labels keep them distinct.
        assert_ne!(content_key(&a), content_key(&b));

        let long = "x".repeat(300);
        let c = doc(&long, "s");
        let d = doc(&format!("{}tail-difference", "x".repeat(200)), "s");
        // Only the first 200 chars participate.
        assert_eq!(content_key(&c), content_key(&d));
    }

    #[test]
    fn test_fused_scores_descend() {
        let primary = vec![doc("a", "s"), doc("b", "s"), doc("c", "s")];
        let secondary = vec![doc("c", "s"), doc("a", "s"), doc("d", "s")];
        let fused = fuse(&primary, &secondary, 8, FusionWeights::default());

        // Recompute scores for the output order and check monotonicity.
        let score = |content: &str| -> f64 {
            let mut s = 0.0;
            for (rank, d) in primary.iter().enumerate() {
                if d.content == content {
                    s += 1.0 / (RRF_K + (rank + 1) as f64);
                }
            }
            for (rank, d) in secondary.iter().enumerate() {
                if d.content == content {
                    s += 0.8 / (RRF_K + (rank + 1) as f64);
                }
            }
            s
        };
        let scores: Vec<f64> = fused.iter().map(|d| score(&d.content)).collect();
        for pair in scores.windows(2) {
            assert!(pair[0] >= pair[1], "fused output not sorted: {scores:?}");
        }
    }
}
