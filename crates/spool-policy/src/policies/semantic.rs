use spool_core::config::{MemoryPolicy, SpoolConfig};
use spool_core::errors::SpoolResult;
use spool_core::models::{merge_ranges, RetentionDecision, SpanRange};
use spool_core::traits::ILanguageModel;
use spool_embeddings::SpanEmbedder;

use crate::knapsack::{choose_under_budget, BudgetItem};

use super::{build_spans, sliding};

/// Semantic-clustering eviction.
///
/// Decodes the buffer into overlapping spans, embeds them through the
/// cached embedder, clusters with the warm-started centroids, and keeps
/// one representative span per cluster plus everything in the recent
/// quarter of the buffer. The surviving span set is then run through the
/// greedy knapsack so the total kept length respects the budget.
pub fn decide(
    ids: &[u32],
    n_new: usize,
    config: &SpoolConfig,
    model: &dyn ILanguageModel,
    embedder: &mut SpanEmbedder,
) -> SpoolResult<RetentionDecision> {
    let len = ids.len();
    if len + n_new <= config.max_tokens {
        return Ok(RetentionDecision::keep_all(MemoryPolicy::Semantic, len));
    }

    let mut spans = build_spans(model, ids, config.span_size, config.span_stride);
    // Too few spans to cluster meaningfully: slide instead.
    if spans.len() < 2.max(config.semantic_clusters * 2) {
        return Ok(sliding::decide(len));
    }
    // Value tracks retained length, so the budget pass drops whole
    // spans instead of weighing them against each other.
    for span in &mut spans {
        span.value = span.len() as f64;
    }

    let texts: Vec<String> = spans.iter().map(|s| s.text.clone()).collect();
    let embeddings = embedder.encode_spans(&texts)?;

    let mut selected = embedder.select_representatives(
        &embeddings,
        config.semantic_clusters,
        config.recency_bias,
    );

    // The recent quarter of the buffer always survives.
    let recency_threshold = len.saturating_sub(config.max_tokens / 4);
    for (index, span) in spans.iter().enumerate() {
        if span.start >= recency_threshold && !selected.contains(&index) {
            selected.push(index);
        }
    }
    selected.sort_unstable();

    // Enforce the token budget over the selected span set.
    let budget = config.max_tokens.saturating_sub(n_new);
    let items: Vec<BudgetItem> = selected
        .iter()
        .map(|&index| {
            let span = &spans[index];
            BudgetItem::new(index, span.start, span.end, span.value)
        })
        .collect();
    let chosen = choose_under_budget(&items, budget);

    let ranges: Vec<SpanRange> = chosen
        .iter()
        .map(|&index| SpanRange::new(spans[index].start.min(len), spans[index].end.min(len)))
        .collect();
    let keep = merge_ranges(ranges);
    let kept: usize = keep.iter().map(SpanRange::len).sum();

    Ok(RetentionDecision {
        policy: MemoryPolicy::Semantic,
        keep,
        summary: None,
        evicted: len - kept,
        fell_back: false,
    })
}
