//! Lexical relevance via BM25, with the chunk batch as the corpus.
//!
//! There is no persistent index: every call treats the input batch as the
//! whole corpus, computing document frequencies and average length on the
//! fly. Raw scores are normalized into `[0, 1]` by the batch maximum, so the
//! best lexical match in a batch scores 1.0 and a batch with no matching
//! terms scores all zeros.

use super::{ScoreBreakdown, ScoreQuery, Scorer, ScoringResult};
use crate::context::chunk::ConversationChunk;
use std::collections::{HashMap, HashSet};

/// Default term-frequency saturation constant.
pub const DEFAULT_K1: f64 = 1.5;
/// Default length-normalization constant.
pub const DEFAULT_B: f64 = 0.75;

/// Batch-corpus BM25 scorer.
#[derive(Debug, Clone)]
pub struct Bm25Scorer {
    k1: f64,
    b: f64,
}

impl Bm25Scorer {
    pub fn new() -> Self {
        Self {
            k1: DEFAULT_K1,
            b: DEFAULT_B,
        }
    }

    /// Override the term-frequency saturation constant.
    pub fn with_k1(mut self, k1: f64) -> Self {
        self.k1 = k1;
        self
    }

    /// Override the length-normalization constant.
    pub fn with_b(mut self, b: f64) -> Self {
        self.b = b;
        self
    }

    /// Raw (unnormalized) BM25 score of one document against the query.
    fn raw_score(
        &self,
        doc: &[String],
        query_terms: &[String],
        df: &HashMap<String, usize>,
        n_docs: usize,
        avgdl: f64,
    ) -> f64 {
        if doc.is_empty() || query_terms.is_empty() {
            return 0.0;
        }
        let dl = doc.len() as f64;
        let mut tf: HashMap<&str, usize> = HashMap::new();
        for token in doc {
            *tf.entry(token.as_str()).or_insert(0) += 1;
        }

        let mut score = 0.0;
        for term in query_terms {
            let term_tf = tf.get(term.as_str()).copied().unwrap_or(0) as f64;
            if term_tf == 0.0 {
                continue;
            }
            let term_df = df.get(term).copied().unwrap_or(0) as f64;
            let idf = ((n_docs as f64 - term_df + 0.5) / (term_df + 0.5)).ln().max(0.0) + 1.0;
            let denom = term_tf + self.k1 * (1.0 - self.b + self.b * dl / avgdl.max(1e-6));
            score += idf * (term_tf * (self.k1 + 1.0)) / denom.max(1e-6);
        }
        score
    }
}

impl Default for Bm25Scorer {
    fn default() -> Self {
        Self::new()
    }
}

impl Scorer for Bm25Scorer {
    fn score_chunks(
        &self,
        chunks: &[ConversationChunk],
        query: &ScoreQuery,
    ) -> Vec<ScoringResult> {
        let query_terms = distinct_terms(&query.text);
        let docs: Vec<Vec<String>> = chunks.iter().map(|c| tokenize(&c.content)).collect();

        let n_docs = docs.len();
        let total_len: usize = docs.iter().map(|d| d.len()).sum();
        let avgdl = if n_docs == 0 {
            0.0
        } else {
            total_len as f64 / n_docs as f64
        };

        // Document frequency per query term across the batch.
        let mut df: HashMap<String, usize> = HashMap::new();
        for doc in &docs {
            let unique: HashSet<&str> = doc.iter().map(|t| t.as_str()).collect();
            for term in &query_terms {
                if unique.contains(term.as_str()) {
                    *df.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        let raw: Vec<f64> = docs
            .iter()
            .map(|doc| self.raw_score(doc, &query_terms, &df, n_docs, avgdl))
            .collect();
        let max_raw = raw.iter().copied().fold(0.0_f64, f64::max);

        chunks
            .iter()
            .zip(raw)
            .map(|(chunk, score)| {
                let normalized = if max_raw > 0.0 { score / max_raw } else { 0.0 };
                ScoringResult {
                    chunk_id: chunk.id.clone(),
                    score: normalized,
                    breakdown: ScoreBreakdown {
                        bm25: normalized,
                        ..ScoreBreakdown::default()
                    },
                }
            })
            .collect()
    }
}

/// Lowercase tokenization on non-alphanumeric boundaries.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Distinct query terms in first-occurrence order, so float summation order
/// is stable across runs.
fn distinct_terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, content: &str) -> ConversationChunk {
        ConversationChunk::user(id, content, 10)
    }

    #[test]
    fn best_match_scores_one_others_lower() {
        let chunks = vec![
            chunk("c1", "the borrow checker rejects this borrow"),
            chunk("c2", "weather report for tomorrow"),
            chunk("c3", "the checker ran"),
        ];
        let results = Bm25Scorer::new().score_chunks(&chunks, &ScoreQuery::new("borrow checker"));

        assert_eq!(results.len(), 3);
        assert!((results[0].score - 1.0).abs() < 1e-12);
        assert_eq!(results[1].score, 0.0);
        assert!(results[2].score > 0.0 && results[2].score < 1.0);
    }

    #[test]
    fn no_matching_terms_all_zero() {
        let chunks = vec![chunk("c1", "alpha beta"), chunk("c2", "gamma delta")];
        let results = Bm25Scorer::new().score_chunks(&chunks, &ScoreQuery::new("zebra"));
        assert!(results.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn empty_query_all_zero() {
        let chunks = vec![chunk("c1", "alpha beta")];
        let results = Bm25Scorer::new().score_chunks(&chunks, &ScoreQuery::new(""));
        assert_eq!(results[0].score, 0.0);
    }

    #[test]
    fn empty_batch_empty_result() {
        let results = Bm25Scorer::new().score_chunks(&[], &ScoreQuery::new("anything"));
        assert!(results.is_empty());
    }

    #[test]
    fn tokenization_ignores_case_and_punctuation() {
        let chunks = vec![chunk("c1", "Borrow-Checker!"), chunk("c2", "unrelated text")];
        let results = Bm25Scorer::new().score_chunks(&chunks, &ScoreQuery::new("borrow checker"));
        assert!((results[0].score - 1.0).abs() < 1e-12);
        assert_eq!(results[1].score, 0.0);
    }

    #[test]
    fn empty_content_scores_zero() {
        let chunks = vec![chunk("c1", ""), chunk("c2", "borrow checker")];
        let results = Bm25Scorer::new().score_chunks(&chunks, &ScoreQuery::new("borrow"));
        assert_eq!(results[0].score, 0.0);
        assert!(results[1].score > 0.0);
    }

    #[test]
    fn results_preserve_input_order_and_ids() {
        let chunks = vec![chunk("first", "one"), chunk("second", "two")];
        let results = Bm25Scorer::new().score_chunks(&chunks, &ScoreQuery::new("two"));
        assert_eq!(results[0].chunk_id, "first");
        assert_eq!(results[1].chunk_id, "second");
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let chunks = vec![
            chunk("c1", "cache cache cache cache cache"),
            chunk("c2", "cache miss"),
            chunk("c3", "eviction policy for the cache layer"),
        ];
        let results =
            Bm25Scorer::new().score_chunks(&chunks, &ScoreQuery::new("cache eviction miss"));
        for result in &results {
            assert!((0.0..=1.0).contains(&result.score));
        }
    }

    #[test]
    fn deterministic_for_fixed_inputs() {
        let chunks = vec![
            chunk("c1", "parse the config file"),
            chunk("c2", "write the config file to disk"),
        ];
        let query = ScoreQuery::new("config file parse");
        let scorer = Bm25Scorer::new();

        let first: Vec<f64> =
            scorer.score_chunks(&chunks, &query).iter().map(|r| r.score).collect();
        let second: Vec<f64> =
            scorer.score_chunks(&chunks, &query).iter().map(|r| r.score).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn breakdown_carries_only_bm25() {
        let chunks = vec![chunk("c1", "borrow checker")];
        let results = Bm25Scorer::new().score_chunks(&chunks, &ScoreQuery::new("borrow"));
        assert_eq!(results[0].breakdown.bm25, results[0].score);
        assert_eq!(results[0].breakdown.recency, 0.0);
        assert_eq!(results[0].breakdown.embedding, 0.0);
    }
}
