//! Semantic similarity scoring over embedding vectors.
//!
//! Chunks carry optional embeddings in their metadata. The query vector
//! comes either precomputed on the [`ScoreQuery`] or from an
//! [`EmbeddingProvider`], embedded once per batch. Anything missing or
//! malformed scores 0.0 rather than failing the pass.

use super::{ScoreBreakdown, ScoreQuery, Scorer, ScoringResult};
use crate::context::chunk::ConversationChunk;
use std::sync::Arc;
use tracing::debug;

/// Capability to embed text into a vector. Implementations typically wrap
/// an API client or a local model.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, String>;
}

/// Scores chunks by cosine similarity between their embeddings and the
/// query embedding.
#[derive(Default)]
pub struct EmbeddingScorer {
    provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl std::fmt::Debug for EmbeddingScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingScorer")
            .field("provider", &self.provider.is_some())
            .finish()
    }
}

impl EmbeddingScorer {
    pub fn new() -> Self {
        Self { provider: None }
    }

    /// Attach a provider used to embed query text when the query carries no
    /// precomputed vector.
    pub fn with_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Resolve the query vector: precomputed wins, then the provider. The
    /// provider is consulted at most once per call.
    fn query_vector(&self, query: &ScoreQuery) -> Option<Vec<f32>> {
        if let Some(embedding) = &query.embedding {
            return Some(embedding.clone());
        }
        let provider = self.provider.as_ref()?;
        match provider.embed(&query.text) {
            Ok(vector) => Some(vector),
            Err(error) => {
                debug!("query embedding failed, scoring zeros: {error}");
                None
            }
        }
    }
}

impl Scorer for EmbeddingScorer {
    fn score_chunks(
        &self,
        chunks: &[ConversationChunk],
        query: &ScoreQuery,
    ) -> Vec<ScoringResult> {
        let query_vec = self.query_vector(query).filter(|v| is_usable(v));
        chunks
            .iter()
            .map(|chunk| {
                let score = match (&query_vec, &chunk.metadata.embedding) {
                    (Some(q), Some(c)) => cosine_similarity(q, c).clamp(0.0, 1.0),
                    _ => 0.0,
                };
                ScoringResult {
                    chunk_id: chunk.id.clone(),
                    score,
                    breakdown: ScoreBreakdown {
                        embedding: score,
                        ..ScoreBreakdown::default()
                    },
                }
            })
            .collect()
    }
}

/// A vector that can meaningfully participate in cosine similarity.
fn is_usable(v: &[f32]) -> bool {
    !v.is_empty() && v.iter().all(|x| x.is_finite()) && v.iter().any(|x| *x != 0.0)
}

/// Cosine similarity with f64 accumulation. Degenerate inputs (length
/// mismatch, empty vectors, non-finite components, near-zero norms) return
/// 0.0 instead of NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        if !x.is_finite() || !y.is_finite() {
            return 0.0;
        }
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }
    dot / denom
}
