//! Greedy budget-driven chunk selection.
//!
//! Mandatory chunks are always retained, even when they alone exceed the
//! token budget. Optional chunks are taken in descending score order until
//! one would push the total past the budget; that chunk stops the walk
//! outright, with no partial inclusion and no backtracking to smaller
//! chunks further down the ranking.

use super::chunk::ConversationChunk;
use super::score::ScoringResult;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// What a pruning pass kept and dropped.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct PruningStats {
    pub original_chunks: usize,
    pub retained_chunks: usize,
    pub original_tokens: usize,
    pub retained_tokens: usize,
    pub chunk_reduction_pct: f64,
    pub token_reduction_pct: f64,
}

impl PruningStats {
    /// Compact one-line form for log output.
    pub fn to_log_string(&self) -> String {
        format!(
            "prune: {} -> {} chunks, {} -> {} tokens ({:.0}% reduction)",
            self.original_chunks,
            self.retained_chunks,
            self.original_tokens,
            self.retained_tokens,
            self.token_reduction_pct
        )
    }
}

/// Retained chunks plus the stats describing the pass.
#[derive(Clone, Debug)]
pub struct PruneResult {
    /// Surviving chunks, in the same relative order as the input.
    pub retained: Vec<ConversationChunk>,
    pub stats: PruningStats,
}

/// Select chunks to keep under `budget` tokens.
///
/// A chunk is mandatory when its metadata flag is set or its id appears in
/// `mandatory_ids`. Chunks missing from `scores` rank as 0.0. Score ties
/// break toward the newer timestamp, then input order.
pub fn prune_chunks(
    chunks: &[ConversationChunk],
    scores: &[ScoringResult],
    budget: usize,
    mandatory_ids: &HashSet<String>,
) -> PruneResult {
    let score_by_id: HashMap<&str, f64> = scores
        .iter()
        .map(|r| (r.chunk_id.as_str(), r.score))
        .collect();

    let mut mandatory = Vec::new();
    let mut optional = Vec::new();
    for (index, chunk) in chunks.iter().enumerate() {
        if chunk.metadata.mandatory || mandatory_ids.contains(&chunk.id) {
            mandatory.push(index);
        } else {
            optional.push(index);
        }
    }

    optional.sort_by(|&a, &b| {
        let score_a = score_by_id.get(chunks[a].id.as_str()).copied().unwrap_or(0.0);
        let score_b = score_by_id.get(chunks[b].id.as_str()).copied().unwrap_or(0.0);
        score_b
            .total_cmp(&score_a)
            .then_with(|| chunks[b].timestamp_ms.cmp(&chunks[a].timestamp_ms))
            .then_with(|| a.cmp(&b))
    });

    let mut kept: HashSet<usize> = mandatory.iter().copied().collect();
    let mut used_tokens: usize = mandatory.iter().map(|&i| chunks[i].tokens).sum();

    for &index in &optional {
        if used_tokens + chunks[index].tokens > budget {
            break;
        }
        used_tokens += chunks[index].tokens;
        kept.insert(index);
    }

    let retained: Vec<ConversationChunk> = chunks
        .iter()
        .enumerate()
        .filter(|(index, _)| kept.contains(index))
        .map(|(_, chunk)| chunk.clone())
        .collect();

    let original_tokens: usize = chunks.iter().map(|c| c.tokens).sum();
    let retained_tokens: usize = retained.iter().map(|c| c.tokens).sum();
    let stats = PruningStats {
        original_chunks: chunks.len(),
        retained_chunks: retained.len(),
        original_tokens,
        retained_tokens,
        chunk_reduction_pct: reduction_pct(chunks.len(), retained.len()),
        token_reduction_pct: reduction_pct(original_tokens, retained_tokens),
    };
    debug!("{}", stats.to_log_string());

    PruneResult { retained, stats }
}

fn reduction_pct(original: usize, retained: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original - retained) as f64 / original as f64 * 100.0
}
