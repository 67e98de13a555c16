use serde::{Deserialize, Serialize};

/// Tunables for one engine instance.
///
/// Constructed explicitly and passed into the engine; there is no ambient
/// global configuration, so tests can instantiate several engines with
/// different settings side by side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum alternative phrasings requested by EXPAND
    pub max_expansions: usize,
    /// Final fused result count per RETRIEVE pass
    pub top_k: usize,
    /// Per-query result count requested from the lexical index
    pub lexical_k: usize,
    /// RRF weight for the dense-vector pool
    pub vector_weight: f64,
    /// RRF weight for the lexical pool
    pub lexical_weight: f64,
    /// Hard character budget per document content after fusion
    pub max_context_chars: usize,
    /// Maximum refinement loops after the initial pass
    pub max_loops: u32,
    /// ANN probe count (index-side search breadth)
    pub probes: u32,
    /// Oversampling factor for chunk-to-article dedup inside the ANN path
    pub oversample: usize,
    /// Content prefix shown to the grader per candidate
    pub grade_prefix_chars: usize,
    /// Context excerpt shown to the verifier
    pub verify_context_chars: usize,
    /// Draft excerpt shown to the verifier
    pub verify_answer_chars: usize,
    /// Per-call deadline for upstream network calls, in seconds
    pub request_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_expansions: 3,
            top_k: 8,
            lexical_k: 20,
            vector_weight: 1.0,
            lexical_weight: 0.8,
            max_context_chars: 14_000,
            max_loops: 2,
            probes: 20,
            oversample: 6,
            grade_prefix_chars: 1200,
            verify_context_chars: 6000,
            verify_answer_chars: 4000,
            request_timeout_secs: 30,
        }
    }
}
