//! High-level facade wiring registry, scoring, and pruning together.

use super::chunk::ConversationChunk;
use super::prune::{PruneResult, prune_chunks};
use super::registry::ChunkRegistry;
use super::score::{HybridScorer, ScoreQuery, Scorer};
use std::collections::HashSet;
use tracing::debug;

/// Owns a [`ChunkRegistry`] and a [`HybridScorer`] and runs full
/// optimization passes over the held conversation.
///
/// A pass reads the registry without mutating it: callers decide what to do
/// with the retained set, and the registry keeps everything for later
/// passes against different budgets or queries.
#[derive(Debug, Default)]
pub struct ContextOptimizer {
    registry: ChunkRegistry,
    scorer: HybridScorer,
}

impl ContextOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the scorer, keeping the registry.
    pub fn with_scorer(mut self, scorer: HybridScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn registry(&self) -> &ChunkRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ChunkRegistry {
        &mut self.registry
    }

    /// Add a batch of chunks, returning how many the registry accepted.
    pub fn load(&mut self, chunks: Vec<ConversationChunk>) -> usize {
        chunks
            .into_iter()
            .filter(|chunk| self.registry.add(chunk.clone()))
            .count()
    }

    /// Score every held chunk against `query` and prune to `budget` tokens.
    pub fn optimize(
        &self,
        query: &ScoreQuery,
        budget: usize,
        mandatory_ids: &HashSet<String>,
    ) -> PruneResult {
        let chunks = self.registry.all_chunks();
        let scores = self.scorer.score_chunks(&chunks, query);
        let result = prune_chunks(&chunks, &scores, budget, mandatory_ids);
        debug!(
            "optimization pass: {} chunks held, {} retained, budget {}",
            chunks.len(),
            result.retained.len(),
            budget
        );
        result
    }
}
