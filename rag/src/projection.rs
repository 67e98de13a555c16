//! Query-embedding pipeline: raw embedding, L2 normalization, and an
//! optional fixed linear projection down to the index's native
//! dimensionality (e.g., 3072 -> 1024).
//!
//! The projection applies only when the raw embedding's dimensionality
//! matches the matrix's declared input dimension exactly; otherwise the
//! normalized raw vector passes through unchanged. A mismatch signals an
//! embedding-backend/index disagreement that belongs at configuration
//! time, so it is never surfaced as a request-time error and the vector is
//! never partially projected.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::embeddings::EmbeddingProvider;
use crate::error::EngineError;

/// L2-normalize a vector. The epsilon guards against a zero vector.
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt() + 1e-12;
    v.iter().map(|x| (*x as f64 / norm) as f32).collect()
}

#[derive(Deserialize)]
struct MatrixFile {
    w: Vec<Vec<f32>>,
}

/// An immutable dense projection matrix (`rows` x `cols`), loaded once and
/// shared read-only across all projection calls.
#[derive(Debug, Clone)]
pub struct ProjectionMatrix {
    w: Vec<Vec<f32>>,
    rows: usize,
    cols: usize,
}

impl ProjectionMatrix {
    /// Build from a row-major matrix, validating that it is rectangular.
    pub fn new(w: Vec<Vec<f32>>) -> Result<Self, EngineError> {
        let rows = w.len();
        if rows == 0 {
            return Err(EngineError::Projection("matrix has no rows".to_string()));
        }
        let cols = w[0].len();
        if cols == 0 {
            return Err(EngineError::Projection("matrix has no columns".to_string()));
        }
        if let Some(bad) = w.iter().position(|row| row.len() != cols) {
            return Err(EngineError::Projection(format!(
                "row {bad} has {} columns, expected {cols}",
                w[bad].len()
            )));
        }
        Ok(Self { w, rows, cols })
    }

    /// Load from a JSON file of the form `{"w": [[...], ...]}`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Projection(format!("{}: {e}", path.display())))?;
        let parsed: MatrixFile = serde_json::from_str(&raw)
            .map_err(|e| EngineError::Projection(format!("{}: {e}", path.display())))?;
        Self::new(parsed.w)
    }

    /// Declared input dimensionality (columns).
    pub fn input_dim(&self) -> usize {
        self.cols
    }

    /// Output dimensionality (rows).
    pub fn output_dim(&self) -> usize {
        self.rows
    }

    /// Matrix-vector product. Callers must have checked `input_dim`.
    fn multiply(&self, v: &[f32]) -> Vec<f32> {
        self.w
            .iter()
            .map(|row| {
                row.iter()
                    .zip(v)
                    .map(|(a, b)| *a as f64 * *b as f64)
                    .sum::<f64>() as f32
            })
            .collect()
    }
}

/// Produces search-ready query vectors: embed, normalize, maybe project.
pub struct QueryEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    projection: Option<Arc<ProjectionMatrix>>,
}

impl QueryEmbedder {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        projection: Option<Arc<ProjectionMatrix>>,
    ) -> Self {
        Self {
            provider,
            projection,
        }
    }

    /// Embed a query string into a unit vector in the index's space.
    ///
    /// Deterministic for a fixed provider response and projection matrix.
    pub async fn embed(&self, query: &str) -> Result<Vec<f32>, EngineError> {
        let raw = self.provider.embed(query).await?;
        let normalized = l2_normalize(&raw);

        match &self.projection {
            Some(matrix) if matrix.input_dim() == normalized.len() => {
                Ok(l2_normalize(&matrix.multiply(&normalized)))
            }
            Some(matrix) => {
                log::debug!(
                    "projection skipped: embedding dim {} != matrix input dim {}",
                    normalized.len(),
                    matrix.input_dim()
                );
                Ok(normalized)
            }
            None => Ok(normalized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Returns a fixed vector regardless of input.
    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EngineError> {
            Ok(self.0.clone())
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
            Ok(texts.iter().map(|_| self.0.clone()).collect())
        }

        fn dimensions(&self) -> usize {
            self.0.len()
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn assert_unit(v: &[f32]) {
        let norm: f64 = v.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "norm was {norm}");
    }

    #[test]
    fn test_l2_normalize_unit_length() {
        let v = l2_normalize(&[3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert_unit(&v);
    }

    #[test]
    fn test_l2_normalize_zero_vector_is_finite() {
        let v = l2_normalize(&[0.0, 0.0, 0.0]);
        assert!(v.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_ragged_matrix_rejected() {
        let err = ProjectionMatrix::new(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, EngineError::Projection(_)));
    }

    #[tokio::test]
    async fn test_projection_applied_on_matching_dims() {
        // 2x3 matrix picking out the first two coordinates.
        let matrix = ProjectionMatrix::new(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
        ])
        .unwrap();
        let embedder = QueryEmbedder::new(
            Arc::new(FixedEmbedder(vec![1.0, 1.0, 0.0])),
            Some(Arc::new(matrix)),
        );
        let v = embedder.embed("q").await.unwrap();
        assert_eq!(v.len(), 2);
        assert_unit(&v);
        assert!((v[0] - v[1]).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_passes_through() {
        // Matrix declares 3072 inputs; the embedding is 4-d. The normalized
        // raw vector must come back unchanged in dimension.
        let matrix = ProjectionMatrix::new(vec![vec![0.0; 3072]; 1024]).unwrap();
        assert_eq!(matrix.input_dim(), 3072);
        assert_eq!(matrix.output_dim(), 1024);

        let embedder = QueryEmbedder::new(
            Arc::new(FixedEmbedder(vec![2.0, 0.0, 0.0, 0.0])),
            Some(Arc::new(matrix)),
        );
        let v = embedder.embed("q").await.unwrap();
        assert_eq!(v.len(), 4);
        assert!((v[0] - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_embed_is_deterministic() {
        let matrix = Arc::new(
            ProjectionMatrix::new(vec![vec![0.3, -0.7, 0.1], vec![0.5, 0.2, -0.4]]).unwrap(),
        );
        let embedder = QueryEmbedder::new(
            Arc::new(FixedEmbedder(vec![0.2, -0.9, 0.4])),
            Some(Arc::new(ProjectionMatrix::clone(&matrix))),
        );
        let a = embedder.embed("same query").await.unwrap();
        let b = embedder.embed("same query").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_no_projection_configured() {
        let embedder = QueryEmbedder::new(Arc::new(FixedEmbedder(vec![0.0, 5.0])), None);
        let v = embedder.embed("q").await.unwrap();
        assert_eq!(v.len(), 2);
        assert_unit(&v);
    }
}
