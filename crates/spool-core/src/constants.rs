/// Spool system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default token capacity for a session buffer.
pub const DEFAULT_MAX_TOKENS: usize = 512;

/// Default size of the always-kept recent window.
pub const DEFAULT_WINDOW_SIZE: usize = 128;

/// Default number of semantic clusters.
pub const DEFAULT_SEMANTIC_CLUSTERS: usize = 4;

/// Default span size for semantic embedding.
pub const DEFAULT_SPAN_SIZE: usize = 64;

/// Default stride between consecutive spans.
pub const DEFAULT_SPAN_STRIDE: usize = 32;

/// Default un-summarized tail length that triggers a rolling summary.
pub const DEFAULT_SUMMARY_INTERVAL: usize = 256;

/// Default capacity of the span-embedding cache.
pub const DEFAULT_EMBEDDING_CACHE_SIZE: usize = 1000;

/// Default recency bias blended into representative selection.
pub const DEFAULT_RECENCY_BIAS: f64 = 0.15;

/// Default number of masked-span probes for the importance policy.
pub const DEFAULT_IMPORTANCE_PROBES: usize = 8;

/// Default capacity of the sentence-anchor cache.
pub const DEFAULT_ANCHOR_CACHE_SIZE: usize = 100;

/// Maximum number of spans sent to the embedding provider per batch.
pub const MAX_EMBED_BATCH_SIZE: usize = 32;

/// Minimum number of most-recent tokens the scored policies always keep.
pub const MIN_RECENCY_KEEP: usize = 64;

/// Lloyd refinement passes on a cold clustering start.
pub const COLD_START_ITERATIONS: usize = 10;
