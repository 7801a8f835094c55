//! # spool-embeddings
//!
//! Content-addressed span embeddings for the semantic policy: a strict
//! LRU cache keyed by blake3 text hashes, batched provider calls, and
//! warm-started incremental clustering that keeps representative choices
//! stable across turns.

mod cache;
mod cluster;
mod embedder;

pub use cache::{CacheStats, EmbeddingCache};
pub use cluster::ClusterState;
pub use embedder::SpanEmbedder;
