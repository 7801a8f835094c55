use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::errors::{SpoolError, SpoolResult};

/// Eviction strategy selected for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryPolicy {
    Sliding,
    Importance,
    Semantic,
    RollingSummary,
    Hybrid,
}

impl MemoryPolicy {
    /// Canonical lowercase name, matching the config surface.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sliding => "sliding",
            Self::Importance => "importance",
            Self::Semantic => "semantic",
            Self::RollingSummary => "rolling_summary",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for MemoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MemoryPolicy {
    type Err = SpoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sliding" => Ok(Self::Sliding),
            "importance" => Ok(Self::Importance),
            "semantic" => Ok(Self::Semantic),
            "rolling_summary" => Ok(Self::RollingSummary),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(SpoolError::invalid_config(
                "memory_policy",
                format!("unknown policy {other:?}"),
            )),
        }
    }
}

/// Session configuration.
///
/// Validated once at construction; a session is never built from an
/// invalid config, so the engine can assume every field is in range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoolConfig {
    /// Token capacity of the buffer and the final context.
    pub max_tokens: usize,
    /// Recent window always preserved verbatim.
    pub window_size: usize,
    /// Active eviction strategy.
    pub memory_policy: MemoryPolicy,
    /// Number of clusters for the semantic policy.
    pub semantic_clusters: usize,
    /// Span length (tokens) for semantic embedding.
    pub span_size: usize,
    /// Stride between consecutive spans.
    pub span_stride: usize,
    /// Un-summarized tail length that triggers a rolling summary.
    pub summary_interval: usize,
    /// Wall-clock budget per policy invocation. `None` disables budgeting.
    pub max_policy_ms: Option<u64>,
    /// Capacity of the span-embedding LRU cache.
    pub embedding_cache_size: usize,
    /// Recency bias blended into cluster-representative selection.
    pub recency_bias: f64,
    /// Masked-span probe count for the importance policy.
    pub importance_probes: usize,
    /// Capacity of the sentence-anchor LRU cache.
    pub anchor_cache_size: usize,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            max_tokens: constants::DEFAULT_MAX_TOKENS,
            window_size: constants::DEFAULT_WINDOW_SIZE,
            memory_policy: MemoryPolicy::Sliding,
            semantic_clusters: constants::DEFAULT_SEMANTIC_CLUSTERS,
            span_size: constants::DEFAULT_SPAN_SIZE,
            span_stride: constants::DEFAULT_SPAN_STRIDE,
            summary_interval: constants::DEFAULT_SUMMARY_INTERVAL,
            max_policy_ms: None,
            embedding_cache_size: constants::DEFAULT_EMBEDDING_CACHE_SIZE,
            recency_bias: constants::DEFAULT_RECENCY_BIAS,
            importance_probes: constants::DEFAULT_IMPORTANCE_PROBES,
            anchor_cache_size: constants::DEFAULT_ANCHOR_CACHE_SIZE,
        }
    }
}

impl SpoolConfig {
    /// Check every numeric parameter. Called by `Session::new`; fails fast
    /// rather than degrading at runtime.
    pub fn validate(&self) -> SpoolResult<()> {
        if self.max_tokens == 0 {
            return Err(SpoolError::invalid_config("max_tokens", "must be positive"));
        }
        if self.window_size == 0 {
            return Err(SpoolError::invalid_config("window_size", "must be positive"));
        }
        if self.window_size > self.max_tokens {
            return Err(SpoolError::invalid_config(
                "window_size",
                format!(
                    "must not exceed max_tokens ({} > {})",
                    self.window_size, self.max_tokens
                ),
            ));
        }
        if self.semantic_clusters == 0 {
            return Err(SpoolError::invalid_config(
                "semantic_clusters",
                "must be positive",
            ));
        }
        if self.span_size == 0 {
            return Err(SpoolError::invalid_config("span_size", "must be positive"));
        }
        if self.span_stride == 0 || self.span_stride > self.span_size {
            return Err(SpoolError::invalid_config(
                "span_stride",
                format!(
                    "must be in 1..={} (span_size), got {}",
                    self.span_size, self.span_stride
                ),
            ));
        }
        if self.summary_interval == 0 {
            return Err(SpoolError::invalid_config(
                "summary_interval",
                "must be positive",
            ));
        }
        if self.embedding_cache_size == 0 {
            return Err(SpoolError::invalid_config(
                "embedding_cache_size",
                "must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.recency_bias) {
            return Err(SpoolError::invalid_config(
                "recency_bias",
                format!("must be between 0.0 and 1.0, got {}", self.recency_bias),
            ));
        }
        if self.importance_probes == 0 {
            return Err(SpoolError::invalid_config(
                "importance_probes",
                "must be positive",
            ));
        }
        if self.anchor_cache_size == 0 {
            return Err(SpoolError::invalid_config(
                "anchor_cache_size",
                "must be positive",
            ));
        }
        Ok(())
    }
}
