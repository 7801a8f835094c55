use serde::{Deserialize, Serialize};

/// Diagnostics for finite-memory behavior.
///
/// Every counter is monotonically non-decreasing except
/// `tokens_retained` (tracks the current buffer size) and
/// `policy_latency_ms` (last observation; percentiles live in the
/// telemetry collector). Callers receive read-only snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub tokens_seen: u64,
    pub tokens_retained: u64,
    pub evictions: u64,
    pub summaries_created: u64,
    pub total_policy_calls: u64,
    pub fallback_count: u64,
    pub anchor_cache_hits: u64,
    pub embedding_cache_hits: u64,
    pub embedding_cache_misses: u64,
    /// Duration of the most recent policy invocation.
    pub policy_latency_ms: f64,
}

impl MemoryStats {
    /// Ratio of tokens seen to tokens currently retained.
    pub fn compression_ratio(&self) -> f64 {
        if self.tokens_seen == 0 {
            return 1.0;
        }
        self.tokens_seen as f64 / (self.tokens_retained.max(1)) as f64
    }

    /// Hit rate of the span-embedding cache.
    pub fn embedding_hit_rate(&self) -> f64 {
        let total = self.embedding_cache_hits + self.embedding_cache_misses;
        if total == 0 {
            return 0.0;
        }
        self.embedding_cache_hits as f64 / total as f64
    }
}
