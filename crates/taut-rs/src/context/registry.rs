//! Indexed registry owning the working set of conversation chunks.
//!
//! The registry is the exclusive owner of the candidate chunks for one
//! optimization pass: O(1) add/remove/lookup, a running token total
//! maintained on every mutation (never recomputed by scanning), and a
//! secondary role index for filtered reads. Ordered reads return clone
//! snapshots in insertion order.

use crate::context::chunk::{ChunkRole, ConversationChunk};
use std::collections::{HashMap, HashSet};

/// A held chunk plus its insertion sequence number.
///
/// The sequence keeps removal O(1): ordered snapshots sort by it on read
/// instead of maintaining an order vector that removal would have to scan.
#[derive(Debug, Clone)]
struct Slot {
    seq: u64,
    chunk: ConversationChunk,
}

/// Indexed owner of the chunks considered for one context pass.
///
/// # Example
///
/// ```
/// use taut_rs::context::{ChunkRegistry, ConversationChunk};
///
/// let mut registry = ChunkRegistry::new();
/// registry.add(ConversationChunk::user("u1", "what does the parser do?", 7));
/// registry.add(ConversationChunk::tool("t1", "fn parse(..) { .. }", 12));
/// assert_eq!(registry.len(), 2);
/// assert_eq!(registry.total_tokens(), 19);
/// ```
#[derive(Debug)]
pub struct ChunkRegistry {
    slots: HashMap<String, Slot>,
    by_role: HashMap<ChunkRole, HashSet<String>>,
    next_seq: u64,
    total_tokens: usize,
}

impl ChunkRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            by_role: HashMap::new(),
            next_seq: 0,
            total_tokens: 0,
        }
    }

    /// Insert a chunk.
    ///
    /// Returns `false` and leaves the registry untouched when the id is
    /// empty (malformed) or already present. Duplicate ids are rejected,
    /// never overwritten: an overwrite would silently change the token
    /// total mid-pass and break the unique-id invariant under replay.
    pub fn add(&mut self, chunk: ConversationChunk) -> bool {
        if chunk.id.is_empty() || self.slots.contains_key(&chunk.id) {
            return false;
        }
        let id = chunk.id.clone();
        self.total_tokens += chunk.tokens;
        self.by_role.entry(chunk.role).or_default().insert(id.clone());
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.insert(id, Slot { seq, chunk });
        true
    }

    /// Remove a chunk by id, returning it if it was present.
    pub fn remove(&mut self, id: &str) -> Option<ConversationChunk> {
        let slot = self.slots.remove(id)?;
        self.total_tokens = self.total_tokens.saturating_sub(slot.chunk.tokens);
        if let Some(ids) = self.by_role.get_mut(&slot.chunk.role) {
            ids.remove(id);
        }
        Some(slot.chunk)
    }

    /// Look up a chunk by id.
    pub fn get(&self, id: &str) -> Option<&ConversationChunk> {
        self.slots.get(id).map(|slot| &slot.chunk)
    }

    /// Whether a chunk with this id is held.
    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    /// Snapshot of all chunks in insertion order.
    pub fn all_chunks(&self) -> Vec<ConversationChunk> {
        let mut slots: Vec<&Slot> = self.slots.values().collect();
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| slot.chunk.clone()).collect()
    }

    /// Snapshot of the chunks with the given role, insertion order preserved.
    pub fn chunks_by_role(&self, role: ChunkRole) -> Vec<ConversationChunk> {
        let Some(ids) = self.by_role.get(&role) else {
            return Vec::new();
        };
        let mut slots: Vec<&Slot> = ids.iter().filter_map(|id| self.slots.get(id)).collect();
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| slot.chunk.clone()).collect()
    }

    /// Running token total over the held chunks. O(1), maintained on every
    /// add and remove.
    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    /// Number of held chunks.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the registry holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Backfill an embedding on an already-held chunk, the one mutation
    /// allowed after insertion. Returns whether the chunk was present.
    pub fn attach_embedding(&mut self, id: &str, embedding: Vec<f32>) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) => {
                slot.chunk.metadata.embedding = Some(embedding);
                true
            }
            None => false,
        }
    }

    /// Drop all chunks and reset every index and counter.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.by_role.clear();
        self.next_seq = 0;
        self.total_tokens = 0;
    }
}

impl Default for ChunkRegistry {
    fn default() -> Self {
        Self::new()
    }
}
