//! Context-window management: what to keep when the budget is tight.
//!
//! The pipeline has three steps. A [`ChunkRegistry`] owns the working set
//! of conversation chunks. The [`score`] module ranks those chunks against
//! a query. [`prune_chunks`] then selects the subset that fits a token
//! budget while keeping every mandatory chunk. [`ContextOptimizer`] wires
//! the three together for callers that want a single entry point.

pub mod chunk;
pub mod optimizer;
pub mod prune;
pub mod registry;
pub mod score;

pub use chunk::{ChunkMetadata, ChunkRole, ConversationChunk};
pub use optimizer::ContextOptimizer;
pub use prune::{PruneResult, PruningStats, prune_chunks};
pub use registry::ChunkRegistry;
