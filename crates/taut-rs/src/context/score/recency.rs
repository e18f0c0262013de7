//! Exponential time-decay scoring.
//!
//! A chunk's score halves every half-life, so a chunk created right now
//! scores 1.0 and one created a half-life ago scores 0.5. Timestamps in the
//! future clamp to 1.0 rather than exceeding it.

use super::{ScoreBreakdown, ScoreQuery, Scorer, ScoringResult};
use crate::context::chunk::ConversationChunk;

/// Default half-life of one hour.
pub const DEFAULT_HALF_LIFE_MS: i64 = 3_600_000;

/// Scores chunks by age with exponential decay.
#[derive(Debug, Clone)]
pub struct RecencyScorer {
    half_life_ms: i64,
    /// Fixed "now" for scoring. When unset, wall clock is read per call.
    reference_time_ms: Option<i64>,
}

impl RecencyScorer {
    pub fn new() -> Self {
        Self {
            half_life_ms: DEFAULT_HALF_LIFE_MS,
            reference_time_ms: None,
        }
    }

    /// Override the half-life. Values below 1ms are clamped up.
    pub fn with_half_life(mut self, half_life_ms: i64) -> Self {
        self.half_life_ms = half_life_ms.max(1);
        self
    }

    /// Pin the reference time, making scores reproducible in tests and
    /// consistent across a single optimization pass.
    pub fn with_reference_time(mut self, reference_time_ms: i64) -> Self {
        self.reference_time_ms = Some(reference_time_ms);
        self
    }
}

impl Default for RecencyScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl Scorer for RecencyScorer {
    fn score_chunks(
        &self,
        chunks: &[ConversationChunk],
        _query: &ScoreQuery,
    ) -> Vec<ScoringResult> {
        let reference = self.reference_time_ms.unwrap_or_else(crate::epoch_ms);
        chunks
            .iter()
            .map(|chunk| {
                let age_ms = reference.saturating_sub(chunk.timestamp_ms).max(0) as f64;
                let score = 0.5_f64.powf(age_ms / self.half_life_ms as f64);
                ScoringResult {
                    chunk_id: chunk.id.clone(),
                    score,
                    breakdown: ScoreBreakdown {
                        recency: score,
                        ..ScoreBreakdown::default()
                    },
                }
            })
            .collect()
    }
}
