//! Relevance scoring: independent signals combined into a hybrid rank.
//!
//! Each scorer is a stateless function of `(chunks, query)` producing one
//! [`ScoringResult`] per input chunk, in input order. Scorers never fail:
//! degraded per-chunk data (missing embeddings, malformed vectors, empty
//! text) contributes a 0 score rather than an error, so one bad chunk or a
//! broken embedding backend can never abort a pruning pass.
//!
//! - [`Bm25Scorer`]: lexical overlap, BM25 with the batch as its corpus.
//! - [`RecencyScorer`]: exponential decay by age, configurable half-life.
//! - [`EmbeddingScorer`]: cosine similarity over embedding vectors.
//! - [`HybridScorer`]: weighted sum of the three, breakdown retained.

pub mod bm25;
pub mod embedding;
pub mod hybrid;
pub mod recency;

pub use bm25::Bm25Scorer;
pub use embedding::{EmbeddingProvider, EmbeddingScorer};
pub use hybrid::{HybridScorer, HybridWeights};
pub use recency::RecencyScorer;

use crate::context::chunk::ConversationChunk;
use serde::{Deserialize, Serialize};

/// Relevance query handed in by the turn loop: free text plus an optional
/// precomputed embedding of that text.
#[derive(Clone, Debug, Default)]
pub struct ScoreQuery {
    pub text: String,
    pub embedding: Option<Vec<f32>>,
}

impl ScoreQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            embedding: None,
        }
    }

    /// Attach a precomputed query embedding; the semantic scorer then skips
    /// provider generation entirely.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// Per-signal score components, each in `[0, 1]`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub bm25: f64,
    pub recency: f64,
    pub embedding: f64,
}

/// Relevance of one chunk for one query.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ScoringResult {
    pub chunk_id: String,
    /// Combined score in `[0, 1]`.
    pub score: f64,
    /// The individual signals behind `score`, kept for observability.
    pub breakdown: ScoreBreakdown,
}

/// Contract shared by all scorers.
///
/// Implementations return exactly one result per input chunk, in input
/// order, are deterministic for fixed inputs, and never panic on malformed
/// chunk data.
pub trait Scorer {
    fn score_chunks(&self, chunks: &[ConversationChunk], query: &ScoreQuery)
    -> Vec<ScoringResult>;
}
