use serde::{Deserialize, Serialize};

use crate::config::{MemoryPolicy, SpoolConfig};
use crate::models::{MemoryStats, TokenRecord};

/// Current checkpoint schema version. Bump on any incompatible change;
/// `restore` rejects anything else outright.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Speaker of a conversation history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One logical message in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub tokens: usize,
}

/// Policy-internal state that must survive a checkpoint round-trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyState {
    /// Per-position importance scores aligned with the buffer.
    pub attention_scores: Vec<f64>,
    /// Accumulated rolling-summary prefix tokens.
    pub summary_tokens: Vec<u32>,
    /// Tokens appended since the last rolling summary.
    pub tokens_since_summary: usize,
    /// Warm-start cluster centroids.
    pub centroids: Vec<Vec<f32>>,
    /// Per-centroid running assignment counts.
    pub centroid_counts: Vec<u64>,
}

/// Serialized session state. The schema is versioned; consumers outside
/// the core read and write this record but never interpret token ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub policy: MemoryPolicy,
    pub config: SpoolConfig,
    pub buffer: Vec<TokenRecord>,
    pub stats: MemoryStats,
    pub policy_state: PolicyState,
    pub history: Vec<HistoryEntry>,
    pub model_name: String,
    pub created_at_ms: i64,
}
