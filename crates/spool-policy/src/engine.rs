use std::sync::Arc;
use std::time::Instant;

use tracing::warn;

use spool_buffer::TokenBuffer;
use spool_core::config::{MemoryPolicy, SpoolConfig};
use spool_core::errors::{SpoolError, SpoolResult};
use spool_core::models::{MemoryStats, PolicyState, RetentionDecision};
use spool_core::traits::{IEmbeddingProvider, ILanguageModel};
use spool_embeddings::SpanEmbedder;

use crate::guard::{guarded_call, BudgetMode};
use crate::policies::rolling_summary::SummaryState;
use crate::policies::{hybrid, importance, rolling_summary, semantic, sliding};
use crate::qa_gate::SummaryQAGate;

/// Dispatches the configured eviction strategy each turn.
///
/// Every non-sliding invocation runs under the latency guard: a strategy
/// that errors or (with a budget configured) overruns is replaced by the
/// sliding decision for that turn, and `fallback_count` is bumped. A
/// turn never fails because a strategy hiccupped.
pub struct PolicyEngine {
    config: SpoolConfig,
    model: Arc<dyn ILanguageModel>,
    embedder: Option<SpanEmbedder>,
    qa_gate: SummaryQAGate,
    attention_scores: Vec<f64>,
    summary_state: SummaryState,
}

/// Pre-invocation copy of everything a strategy may mutate while
/// computing a decision. A discarded run (guard overrun or error) is
/// rolled back to this point, so only decisions that actually reach the
/// buffer leave bookkeeping behind.
struct RollbackPoint {
    attention_scores: Vec<f64>,
    summary_state: SummaryState,
    cluster: Option<(Vec<Vec<f32>>, Vec<u64>)>,
    stats: MemoryStats,
}

impl PolicyEngine {
    /// Build an engine for the configured policy. Fails fast when the
    /// policy needs an embedding provider and none was injected.
    pub fn new(
        config: SpoolConfig,
        model: Arc<dyn ILanguageModel>,
        embedding: Option<Arc<dyn IEmbeddingProvider>>,
    ) -> SpoolResult<Self> {
        config.validate()?;

        let needs_embeddings = matches!(
            config.memory_policy,
            MemoryPolicy::Semantic | MemoryPolicy::Hybrid
        );
        let embedder = match embedding {
            Some(provider) => Some(SpanEmbedder::new(provider, config.embedding_cache_size)),
            None if needs_embeddings => {
                return Err(SpoolError::invalid_config(
                    "memory_policy",
                    format!(
                        "{} policy requires an embedding provider",
                        config.memory_policy
                    ),
                ));
            }
            None => None,
        };

        Ok(Self {
            config,
            model,
            embedder,
            qa_gate: SummaryQAGate::default(),
            attention_scores: Vec::new(),
            summary_state: SummaryState::default(),
        })
    }

    pub fn config(&self) -> &SpoolConfig {
        &self.config
    }

    /// Run the configured strategy over the buffer snapshot and the
    /// incoming tokens. Always returns a usable decision.
    pub fn apply(
        &mut self,
        buffer: &TokenBuffer,
        new_tokens: &[u32],
        stats: &mut MemoryStats,
    ) -> RetentionDecision {
        stats.total_policy_calls += 1;
        let cache_before = self.embedder.as_ref().map(|e| {
            let cache = e.cache_stats();
            (cache.hits, cache.misses)
        });
        let started = Instant::now();

        let mut decision = if self.config.memory_policy == MemoryPolicy::Sliding {
            sliding::decide(buffer.len())
        } else {
            let rollback = self.rollback_point(stats);
            let mut decision = if let Some(budget_ms) = self.config.max_policy_ms {
                let buffer_len = buffer.len();
                let outcome = guarded_call(
                    budget_ms,
                    BudgetMode::Strict,
                    || self.apply_impl(buffer, new_tokens, stats),
                    || sliding::decide(buffer_len),
                );
                let mut decision = outcome.value;
                if outcome.fell_back {
                    decision.fell_back = true;
                }
                decision
            } else {
                match self.apply_impl(buffer, new_tokens, stats) {
                    Ok(decision) => decision,
                    Err(error) => {
                        warn!(
                            policy = %self.config.memory_policy,
                            %error,
                            "policy failed; falling back to sliding"
                        );
                        let mut decision = sliding::decide(buffer.len());
                        decision.fell_back = true;
                        decision
                    }
                }
            };
            if decision.fell_back {
                // The strategy ran (partially or to an unusable result)
                // before the guard's verdict; none of its state may
                // survive a discarded run.
                self.roll_back(rollback, stats);
                if self.config.memory_policy == MemoryPolicy::RollingSummary {
                    // The new tokens still land in the buffer via the
                    // fallback, so they still count toward the next
                    // compaction.
                    self.summary_state.tokens_since_summary += new_tokens.len();
                }
            }
            decision
        };

        stats.policy_latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        if decision.fell_back {
            decision.policy = MemoryPolicy::Sliding;
            stats.fallback_count += 1;
        }

        if let (Some((hits_before, misses_before)), Some(embedder)) =
            (cache_before, self.embedder.as_ref())
        {
            let after = embedder.cache_stats();
            stats.embedding_cache_hits += after.hits - hits_before;
            stats.embedding_cache_misses += after.misses - misses_before;
        }

        decision
    }

    fn apply_impl(
        &mut self,
        buffer: &TokenBuffer,
        new_tokens: &[u32],
        stats: &mut MemoryStats,
    ) -> SpoolResult<RetentionDecision> {
        let ids = buffer.ids();
        let n_new = new_tokens.len();
        match self.config.memory_policy {
            MemoryPolicy::Sliding => Ok(sliding::decide(ids.len())),
            MemoryPolicy::Importance => importance::decide(
                &ids,
                n_new,
                &self.config,
                self.model.as_ref(),
                &mut self.attention_scores,
            ),
            MemoryPolicy::Semantic => {
                let embedder = self.embedder.as_mut().ok_or_else(|| {
                    SpoolError::invalid_config("memory_policy", "embedder missing")
                })?;
                semantic::decide(&ids, n_new, &self.config, self.model.as_ref(), embedder)
            }
            MemoryPolicy::RollingSummary => rolling_summary::decide(
                &ids,
                n_new,
                &self.config,
                self.model.as_ref(),
                &self.qa_gate,
                &mut self.summary_state,
                stats,
            ),
            MemoryPolicy::Hybrid => {
                let embedder = self.embedder.as_mut().ok_or_else(|| {
                    SpoolError::invalid_config("memory_policy", "embedder missing")
                })?;
                hybrid::decide(&ids, n_new, &self.config, self.model.as_ref(), embedder)
            }
        }
    }

    /// Copy everything a strategy run may mutate, so a discarded run can
    /// be rolled back.
    fn rollback_point(&self, stats: &MemoryStats) -> RollbackPoint {
        RollbackPoint {
            attention_scores: self.attention_scores.clone(),
            summary_state: self.summary_state.clone(),
            cluster: self.embedder.as_ref().map(|e| {
                let cluster = e.cluster_state();
                (cluster.centroids().to_vec(), cluster.counts().to_vec())
            }),
            stats: stats.clone(),
        }
    }

    /// Reinstate a rollback point after a discarded strategy run.
    fn roll_back(&mut self, rollback: RollbackPoint, stats: &mut MemoryStats) {
        self.attention_scores = rollback.attention_scores;
        self.summary_state = rollback.summary_state;
        if let (Some((centroids, counts)), Some(embedder)) =
            (rollback.cluster, self.embedder.as_mut())
        {
            embedder.restore_cluster(centroids, counts);
        }
        *stats = rollback.stats;
    }

    /// Realign per-position state with the buffer after the session has
    /// applied a decision. On a fallback the pre-run scores were already
    /// reinstated by the rollback, so all that remains is matching the
    /// sliding outcome: pad for the appended tokens or drop the head
    /// overflow.
    pub fn sync_after_apply(&mut self, buffer_len: usize) {
        let scores = &mut self.attention_scores;
        if scores.len() > buffer_len {
            let excess = scores.len() - buffer_len;
            scores.drain(..excess);
        } else {
            scores.resize(buffer_len, 0.0);
        }
    }

    /// Snapshot the policy-specific state for a checkpoint.
    pub fn policy_state(&self) -> PolicyState {
        let (centroids, centroid_counts) = match &self.embedder {
            Some(embedder) => {
                let cluster = embedder.cluster_state();
                (cluster.centroids().to_vec(), cluster.counts().to_vec())
            }
            None => (Vec::new(), Vec::new()),
        };
        PolicyState {
            attention_scores: self.attention_scores.clone(),
            summary_tokens: self.summary_state.summary_tokens.clone(),
            tokens_since_summary: self.summary_state.tokens_since_summary,
            centroids,
            centroid_counts,
        }
    }

    /// Reinstate checkpointed policy state.
    pub fn restore_state(&mut self, state: PolicyState) {
        self.attention_scores = state.attention_scores;
        self.summary_state = SummaryState {
            summary_tokens: state.summary_tokens,
            tokens_since_summary: state.tokens_since_summary,
        };
        if let Some(embedder) = self.embedder.as_mut() {
            embedder.restore_cluster(state.centroids, state.centroid_counts);
        }
    }

    /// Clear all per-session policy state.
    pub fn reset(&mut self) {
        self.attention_scores.clear();
        self.summary_state = SummaryState::default();
        if let Some(embedder) = self.embedder.as_mut() {
            embedder.reset();
        }
    }
}
