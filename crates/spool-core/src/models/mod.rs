//! Data model shared across the workspace.

mod checkpoint;
mod retention;
mod stats;
mod token;

pub use checkpoint::{Checkpoint, HistoryEntry, PolicyState, Role, CHECKPOINT_VERSION};
pub use retention::{merge_ranges, ranges_from_indices, RetentionDecision, SpanRange};
pub use stats::MemoryStats;
pub use token::{Span, TokenRecord};
