//! Conversation chunk data model: the unit of context the optimizer works on.
//!
//! A chunk is one fragment of conversation history (a user turn, an assistant
//! turn, or a tool result) with a precomputed token cost. The caller creates
//! chunks once per turn and hands them to a
//! [`ChunkRegistry`](crate::context::ChunkRegistry); scoring and pruning see
//! them from there. Once added, a chunk is immutable except for metadata
//! backfill (attaching an embedding computed later).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Role of a conversation chunk.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChunkRole {
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for ChunkRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkRole::User => write!(f, "user"),
            ChunkRole::Assistant => write!(f, "assistant"),
            ChunkRole::Tool => write!(f, "tool"),
        }
    }
}

/// Optional per-chunk metadata.
///
/// A fixed struct with the fields the optimizer knows about, plus a
/// string-keyed extension map (`extra`) so callers can carry their own
/// fields through without this crate modeling them.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ChunkMetadata {
    /// Precomputed embedding vector, if the caller has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Whether this chunk must survive pruning regardless of score.
    #[serde(default)]
    pub mandatory: bool,
    /// Extension fields not modeled above.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

/// One unit of conversation history with an associated token cost.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConversationChunk {
    /// Unique id within one registry instance.
    pub id: String,
    pub role: ChunkRole,
    pub content: String,
    /// Precomputed token count. The optimizer never tokenizes content
    /// itself; counting is the caller's concern.
    pub tokens: usize,
    /// Creation time, unix epoch milliseconds.
    pub timestamp_ms: i64,
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

impl ConversationChunk {
    /// Create a chunk stamped with the current wall-clock time.
    pub fn new(
        id: impl Into<String>,
        role: ChunkRole,
        content: impl Into<String>,
        tokens: usize,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            tokens,
            timestamp_ms: crate::epoch_ms(),
            metadata: ChunkMetadata::default(),
        }
    }

    pub fn user(id: impl Into<String>, content: impl Into<String>, tokens: usize) -> Self {
        Self::new(id, ChunkRole::User, content, tokens)
    }

    pub fn assistant(id: impl Into<String>, content: impl Into<String>, tokens: usize) -> Self {
        Self::new(id, ChunkRole::Assistant, content, tokens)
    }

    pub fn tool(id: impl Into<String>, content: impl Into<String>, tokens: usize) -> Self {
        Self::new(id, ChunkRole::Tool, content, tokens)
    }

    /// Override the creation timestamp (epoch ms).
    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Attach a precomputed embedding vector.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.metadata.embedding = Some(embedding);
        self
    }

    /// Mark this chunk as mandatory: pruning always retains it.
    pub fn mandatory(mut self) -> Self {
        self.metadata.mandatory = true;
        self
    }
}
