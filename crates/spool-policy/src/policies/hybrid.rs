use spool_core::config::{MemoryPolicy, SpoolConfig};
use spool_core::errors::SpoolResult;
use spool_core::models::{ranges_from_indices, RetentionDecision};
use spool_core::traits::ILanguageModel;
use spool_embeddings::SpanEmbedder;

use super::importance::importance_scores;
use super::{build_spans, select_with_recency_floor};

/// Weight of the importance signal in the blended score.
const IMPORTANCE_WEIGHT: f64 = 0.6;
/// Weight of semantic cluster uniqueness in the blended score.
const SEMANTIC_WEIGHT: f64 = 0.4;

/// Hybrid eviction: importance and semantic centrality computed
/// independently, blended 0.6/0.4 per token, top scorers kept under
/// budget plus the recency floor.
pub fn decide(
    ids: &[u32],
    n_new: usize,
    config: &SpoolConfig,
    model: &dyn ILanguageModel,
    embedder: &mut SpanEmbedder,
) -> SpoolResult<RetentionDecision> {
    let len = ids.len();
    if len + n_new <= config.max_tokens {
        return Ok(RetentionDecision::keep_all(MemoryPolicy::Hybrid, len));
    }

    let importance = importance_scores(model, ids, config.importance_probes, config.span_size);
    let semantic = semantic_uniqueness(ids, config, model, embedder)?;

    let combined: Vec<f64> = importance
        .iter()
        .zip(&semantic)
        .map(|(imp, sem)| IMPORTANCE_WEIGHT * imp + SEMANTIC_WEIGHT * sem)
        .collect();

    let target = config.max_tokens.saturating_sub(n_new);
    let kept = select_with_recency_floor(&combined, target);
    let evicted = len - kept.len();

    Ok(RetentionDecision {
        policy: MemoryPolicy::Hybrid,
        keep: ranges_from_indices(&kept),
        summary: None,
        evicted,
        fell_back: false,
    })
}

/// Per-token semantic score: tokens in small (rare) clusters score
/// higher than tokens in large (redundant) ones, max-normalized.
fn semantic_uniqueness(
    ids: &[u32],
    config: &SpoolConfig,
    model: &dyn ILanguageModel,
    embedder: &mut SpanEmbedder,
) -> SpoolResult<Vec<f64>> {
    let len = ids.len();
    let mut scores = vec![0.0f64; len];

    let spans = build_spans(model, ids, config.span_size, config.span_stride);
    if spans.len() < 2 {
        return Ok(scores);
    }

    let texts: Vec<String> = spans.iter().map(|s| s.text.clone()).collect();
    let embeddings = embedder.encode_spans(&texts)?;
    let labels = embedder.cluster_labels(&embeddings, config.semantic_clusters);

    let effective_k = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut cluster_sizes = vec![0usize; effective_k];
    for &label in &labels {
        cluster_sizes[label] += 1;
    }

    for (span, &label) in spans.iter().zip(&labels) {
        let uniqueness = 1.0 / cluster_sizes[label].max(1) as f64;
        for score in &mut scores[span.start..span.end.min(len)] {
            *score = uniqueness;
        }
    }

    let max = scores.iter().cloned().fold(0.0f64, f64::max);
    if max > 0.0 {
        for score in &mut scores {
            *score /= max;
        }
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use spool_core::errors::SpoolError;
    use spool_core::traits::IEmbeddingProvider;

    struct TopicModel;

    impl ILanguageModel for TopicModel {
        fn encode(&self, _text: &str) -> Vec<u32> {
            Vec::new()
        }

        fn decode(&self, tokens: &[u32]) -> SpoolResult<String> {
            Ok(tokens
                .iter()
                .map(|t| format!("topic{}", t / 100))
                .collect::<Vec<_>>()
                .join(" "))
        }

        fn generate(&self, _prompt: &[u32], _max_new_tokens: usize) -> SpoolResult<Vec<u32>> {
            Err(SpoolError::provider("topic-model", "generation unsupported"))
        }

        fn name(&self) -> &str {
            "topic-model"
        }
    }

    struct TopicEmbedder;

    impl IEmbeddingProvider for TopicEmbedder {
        fn encode_batch(&self, texts: &[String]) -> SpoolResult<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    (0..4)
                        .map(|topic| {
                            t.split_whitespace()
                                .filter(|w| *w == format!("topic{topic}"))
                                .count() as f32
                        })
                        .collect()
                })
                .collect())
        }

        fn dimensions(&self) -> usize {
            4
        }

        fn name(&self) -> &str {
            "topic-embedder"
        }
    }

    fn config() -> SpoolConfig {
        SpoolConfig {
            max_tokens: 96,
            window_size: 16,
            semantic_clusters: 2,
            span_size: 8,
            span_stride: 8,
            ..Default::default()
        }
    }

    #[test]
    fn under_capacity_keeps_everything() {
        let mut embedder = SpanEmbedder::new(Arc::new(TopicEmbedder), 100);
        let ids: Vec<u32> = (0..32).collect();
        let decision = decide(&ids, 8, &config(), &TopicModel, &mut embedder).unwrap();
        assert_eq!(decision.kept_len(), 32);
    }

    #[test]
    fn rare_topic_outscores_redundant_one() {
        let mut embedder = SpanEmbedder::new(Arc::new(TopicEmbedder), 100);
        // One span of topic 1 buried under fifteen spans of topic 0.
        let mut ids = vec![0u32; 64];
        ids.extend(std::iter::repeat(100u32).take(8));
        ids.extend(std::iter::repeat(0u32).take(56));

        let decision = decide(&ids, 16, &config(), &TopicModel, &mut embedder).unwrap();
        let kept_positions: Vec<usize> = decision
            .keep
            .iter()
            .flat_map(|r| r.start..r.end)
            .collect();
        // The rare-topic span (tokens 64..72) survives despite being old.
        assert!((64..72).all(|p| kept_positions.contains(&p)));
    }

    #[test]
    fn respects_target_budget() {
        let mut embedder = SpanEmbedder::new(Arc::new(TopicEmbedder), 100);
        let ids: Vec<u32> = vec![0; 256];
        let decision = decide(&ids, 32, &config(), &TopicModel, &mut embedder).unwrap();
        assert!(decision.kept_len() <= 96 - 32);
    }
}
