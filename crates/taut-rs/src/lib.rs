//! Context-window optimization and tool-result caching for LLM agents.
//!
//! An agent loop accumulates far more conversation history than fits in a
//! model's context window, and it re-runs tools whose output has not
//! changed. This crate covers both problems as one in-process library:
//!
//! - [`context::ChunkRegistry`] holds the working set of conversation
//!   chunks with constant-time add/remove/lookup.
//! - [`context::score`] ranks chunks by lexical match (BM25), recency
//!   decay, and embedding similarity, combined by a hybrid scorer.
//! - [`context::prune_chunks`] selects the highest-ranked subset that fits
//!   a token budget while always keeping mandatory chunks.
//! - [`cache::ToolResultCache`] memoizes tool results under canonical
//!   parameter hashes, bounded by entry size, TTL, and an LRU size limit,
//!   with dependency-based invalidation when files change.
//!
//! # Getting started
//!
//! ```ignore
//! use taut_rs::prelude::*;
//!
//! let mut optimizer = ContextOptimizer::new();
//! optimizer.load(chunks);
//! let result = optimizer.optimize(&ScoreQuery::new("current task"), 8_000, &mandatory);
//! send_to_model(result.retained);
//!
//! let cache = ToolResultCache::default();
//! let key = cache.generate_key(&params);
//! if cache.get(key).is_none() {
//!     let output = run_tool(&params);
//!     cache.set(key, params, output, vec!["src/main.rs".into()]);
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`context`] | Chunk registry, relevance scoring, budget pruning |
//! | [`cache`] | Bounded tool-result cache with canonical keying |
//!
//! # Design principles
//!
//! 1. **Scoring never fails.** Malformed embeddings, absent providers, and
//!    empty queries degrade to a 0 contribution, never an error, so one bad
//!    chunk cannot abort an optimization pass.
//! 2. **Budgets bend only for mandatory content.** Pruning may exceed the
//!    token budget exactly when the mandatory set alone exceeds it.
//! 3. **Determinism.** Fixed inputs produce identical scores, identical
//!    retained sets, and identical cache keys across runs and platforms.
//! 4. **No ambient state.** Every registry and cache is an explicitly
//!    constructed instance handed to whoever needs it.

pub mod cache;
pub mod context;
pub mod prelude;

// ── Time ──

/// Current unix epoch in milliseconds.
pub fn epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
