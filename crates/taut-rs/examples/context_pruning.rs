//! Context pruning example: fit a conversation into a token budget.
//!
//! Builds an optimizer over a short conversation, scores the chunks against
//! the current query, and prunes to a budget while the system prompt stays
//! mandatory.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example context_pruning
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use taut_rs::prelude::*;

/// Toy provider: bag-of-letters vectors, enough to demonstrate the seam a
/// real embedding API would plug into.
struct LetterFrequencyProvider;

impl EmbeddingProvider for LetterFrequencyProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
        let mut vector = vec![0.0_f32; 26];
        for c in text.to_lowercase().chars() {
            if c.is_ascii_lowercase() {
                vector[(c as u8 - b'a') as usize] += 1.0;
            }
        }
        Ok(vector)
    }
}

fn main() {
    // 1. Collect the conversation so far. Token counts normally come from
    //    the caller's tokenizer; these are illustrative.
    let provider = LetterFrequencyProvider;
    let chunks: Vec<ConversationChunk> = vec![
        ConversationChunk::user("sys", "You are a careful Rust assistant.", 60).mandatory(),
        ConversationChunk::user("u1", "How do I parse TOML in Rust?", 40),
        ConversationChunk::assistant("a1", "Use the toml crate with serde derive.", 80),
        ConversationChunk::tool("t1", "[dependencies] toml = \"0.8\"", 120),
        ConversationChunk::user("u2", "Now how do I serialize back to TOML?", 45),
    ]
    .into_iter()
    .map(|chunk| {
        let embedding = provider.embed(&chunk.content).unwrap_or_default();
        chunk.with_embedding(embedding)
    })
    .collect();

    // 2. Build the optimizer; the provider also embeds incoming queries.
    let scorer = HybridScorer::new()
        .with_embedding(EmbeddingScorer::new().with_provider(Arc::new(LetterFrequencyProvider)));
    let mut optimizer = ContextOptimizer::new().with_scorer(scorer);
    optimizer.load(chunks);

    // 3. Prune to a 200-token budget for the current query.
    let query = ScoreQuery::new("serialize TOML");
    let result = optimizer.optimize(&query, 200, &HashSet::new());

    // 4. Show what survived.
    println!("{}", result.stats.to_log_string());
    for chunk in &result.retained {
        println!(
            "  kept [{}] {} ({} tokens)",
            chunk.role, chunk.id, chunk.tokens
        );
    }
}
