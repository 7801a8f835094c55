use std::sync::Arc;

use tracing::debug;

use spool_core::constants::MAX_EMBED_BATCH_SIZE;
use spool_core::errors::{SpoolError, SpoolResult};
use spool_core::traits::IEmbeddingProvider;

use crate::cache::{CacheStats, EmbeddingCache};
use crate::cluster::ClusterState;

/// Span embedding front-end for the semantic policy.
///
/// Wraps the injected provider with a content-hash LRU cache and owns
/// the warm-start clustering state. Cache misses are batched into
/// provider calls of at most `MAX_EMBED_BATCH_SIZE` texts to amortize
/// provider overhead.
pub struct SpanEmbedder {
    provider: Arc<dyn IEmbeddingProvider>,
    cache: EmbeddingCache,
    cluster: ClusterState,
}

impl SpanEmbedder {
    pub fn new(provider: Arc<dyn IEmbeddingProvider>, cache_size: usize) -> Self {
        Self {
            provider,
            cache: EmbeddingCache::new(cache_size),
            cluster: ClusterState::new(),
        }
    }

    /// Embed every span text, serving repeats from the cache.
    pub fn encode_spans(&mut self, texts: &[String]) -> SpoolResult<Vec<Vec<f32>>> {
        let mut embeddings: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut miss_indices = Vec::new();

        for text in texts {
            let key = EmbeddingCache::key(text);
            match self.cache.get(&key) {
                Some(vector) => embeddings.push(Some(vector)),
                None => {
                    miss_indices.push(embeddings.len());
                    embeddings.push(None);
                }
            }
        }

        if !miss_indices.is_empty() {
            debug!(
                provider = self.provider.name(),
                misses = miss_indices.len(),
                total = texts.len(),
                "embedding cache misses"
            );
        }

        for chunk in miss_indices.chunks(MAX_EMBED_BATCH_SIZE) {
            let batch: Vec<String> = chunk.iter().map(|&i| texts[i].clone()).collect();
            let vectors = self.provider.encode_batch(&batch)?;
            if vectors.len() != batch.len() {
                return Err(SpoolError::provider(
                    self.provider.name(),
                    format!(
                        "returned {} vectors for {} texts",
                        vectors.len(),
                        batch.len()
                    ),
                ));
            }
            for (&index, vector) in chunk.iter().zip(vectors) {
                self.cache.put(EmbeddingCache::key(&texts[index]), vector.clone());
                embeddings[index] = Some(vector);
            }
        }

        Ok(embeddings.into_iter().flatten().collect())
    }

    /// Cluster the embeddings into `k` groups and pick one representative
    /// per non-empty cluster.
    ///
    /// Representative score blends distance-to-centroid with span
    /// recency: `(1 - bias) * (1 - normalized_distance) + bias * recency`
    /// where recency is the span's relative position. With zero bias the
    /// member nearest its centroid wins outright.
    pub fn select_representatives(
        &mut self,
        embeddings: &[Vec<f32>],
        k: usize,
        recency_bias: f64,
    ) -> Vec<usize> {
        let n = embeddings.len();
        if n == 0 || k == 0 {
            return Vec::new();
        }
        let k = k.min(n);
        let labels = self.cluster.fit(embeddings, k);

        let mut representatives = Vec::with_capacity(k);
        for cluster in 0..k {
            let members: Vec<usize> = (0..n).filter(|&i| labels[i] == cluster).collect();
            if members.is_empty() {
                continue;
            }

            let distances: Vec<f64> = members
                .iter()
                .map(|&i| self.cluster.distance_to(&embeddings[i], cluster))
                .collect();

            let best = if recency_bias > 0.0 {
                let max_distance = distances.iter().cloned().fold(0.0f64, f64::max);
                let mut best_member = members[0];
                let mut best_score = f64::NEG_INFINITY;
                for (&member, &distance) in members.iter().zip(&distances) {
                    let normalized = distance / (max_distance + 1e-6);
                    let recency = member as f64 / (n.saturating_sub(1).max(1)) as f64;
                    let score = (1.0 - recency_bias) * (1.0 - normalized) + recency_bias * recency;
                    if score > best_score {
                        best_score = score;
                        best_member = member;
                    }
                }
                best_member
            } else {
                let mut best_member = members[0];
                let mut best_distance = f64::INFINITY;
                for (&member, &distance) in members.iter().zip(&distances) {
                    if distance < best_distance {
                        best_distance = distance;
                        best_member = member;
                    }
                }
                best_member
            };
            representatives.push(best);
        }

        representatives.sort_unstable();
        representatives
    }

    /// Cluster the embeddings and return the per-span labels without
    /// picking representatives. Used by the hybrid policy to score
    /// cluster uniqueness per token.
    pub fn cluster_labels(&mut self, embeddings: &[Vec<f32>], k: usize) -> Vec<usize> {
        self.cluster.fit(embeddings, k)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cluster_state(&self) -> &ClusterState {
        &self.cluster
    }

    /// Reinstate checkpointed clustering state.
    pub fn restore_cluster(&mut self, centroids: Vec<Vec<f32>>, counts: Vec<u64>) {
        self.cluster = ClusterState::restore(centroids, counts);
    }

    /// Drop all cached vectors and clustering state.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.cluster.clear();
    }
}
