//! Convenience re-exports of the types most callers need.
//!
//! ```ignore
//! use taut_rs::prelude::*;
//! ```

// ── Data model ────────────────────────────────────────────────────────
pub use crate::context::chunk::{ChunkMetadata, ChunkRole, ConversationChunk};
pub use crate::context::registry::ChunkRegistry;

// ── Scoring ───────────────────────────────────────────────────────────
pub use crate::context::score::{
    Bm25Scorer, EmbeddingProvider, EmbeddingScorer, HybridScorer, HybridWeights, RecencyScorer,
    ScoreBreakdown, ScoreQuery, Scorer, ScoringResult,
};

// ── Pruning ───────────────────────────────────────────────────────────
pub use crate::context::optimizer::ContextOptimizer;
pub use crate::context::prune::{PruneResult, PruningStats, prune_chunks};

// ── Caching ───────────────────────────────────────────────────────────
pub use crate::cache::{
    CacheConfig, CacheStats, CacheSweeper, CachedToolResult, ToolResultCache, generate_key,
};
