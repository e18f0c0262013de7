//! Weighted combination of the lexical, recency, and semantic scorers.
//!
//! Each component scores the batch independently, then the hybrid score is
//! the weighted sum normalized by the weight total. Weights that do not sum
//! to 1.0 still produce scores in `[0, 1]`.

use super::bm25::Bm25Scorer;
use super::embedding::EmbeddingScorer;
use super::recency::RecencyScorer;
use super::{ScoreBreakdown, ScoreQuery, Scorer, ScoringResult};
use crate::context::chunk::ConversationChunk;

/// Relative weight of each scoring component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridWeights {
    pub bm25: f64,
    pub recency: f64,
    pub embedding: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            bm25: 0.3,
            recency: 0.2,
            embedding: 0.5,
        }
    }
}

/// Combines [`Bm25Scorer`], [`RecencyScorer`], and [`EmbeddingScorer`] into
/// one ranking signal.
#[derive(Debug, Default)]
pub struct HybridScorer {
    bm25: Bm25Scorer,
    recency: RecencyScorer,
    embedding: EmbeddingScorer,
    weights: HybridWeights,
}

impl HybridScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bm25(mut self, bm25: Bm25Scorer) -> Self {
        self.bm25 = bm25;
        self
    }

    pub fn with_recency(mut self, recency: RecencyScorer) -> Self {
        self.recency = recency;
        self
    }

    pub fn with_embedding(mut self, embedding: EmbeddingScorer) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn with_weights(mut self, weights: HybridWeights) -> Self {
        self.weights = weights;
        self
    }
}

impl Scorer for HybridScorer {
    fn score_chunks(
        &self,
        chunks: &[ConversationChunk],
        query: &ScoreQuery,
    ) -> Vec<ScoringResult> {
        let bm25 = self.bm25.score_chunks(chunks, query);
        let recency = self.recency.score_chunks(chunks, query);
        let embedding = self.embedding.score_chunks(chunks, query);

        let weight_sum = self.weights.bm25 + self.weights.recency + self.weights.embedding;

        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let breakdown = ScoreBreakdown {
                    bm25: bm25[i].score,
                    recency: recency[i].score,
                    embedding: embedding[i].score,
                };
                let score = if weight_sum > 0.0 {
                    (self.weights.bm25 * breakdown.bm25
                        + self.weights.recency * breakdown.recency
                        + self.weights.embedding * breakdown.embedding)
                        / weight_sum
                } else {
                    0.0
                };
                ScoringResult {
                    chunk_id: chunk.id.clone(),
                    score,
                    breakdown,
                }
            })
            .collect()
    }
}
