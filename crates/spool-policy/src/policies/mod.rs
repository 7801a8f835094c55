//! The five eviction strategies.
//!
//! Each strategy is a pure decision over a buffer snapshot: it returns
//! the ranges to keep and never touches the buffer itself. The session
//! applies the decision, so a guard fallback can discard an expensive
//! strategy's answer without unwinding any mutation.

pub mod hybrid;
pub mod importance;
pub mod rolling_summary;
pub mod semantic;
pub mod sliding;

use spool_core::constants::MIN_RECENCY_KEEP;
use spool_core::models::Span;
use spool_core::traits::ILanguageModel;

/// Decode the buffer into overlapping spans for embedding/scoring.
/// Spans that fail to decode or decode to whitespace are skipped.
pub(crate) fn build_spans(
    model: &dyn ILanguageModel,
    ids: &[u32],
    span_size: usize,
    stride: usize,
) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut start = 0;
    while start < ids.len() {
        let end = (start + span_size).min(ids.len());
        if let Ok(text) = model.decode(&ids[start..end]) {
            if !text.trim().is_empty() {
                spans.push(Span::new(start, end, text));
            }
        }
        start += stride;
    }
    spans
}

/// Pick the indices to keep from per-token scores: the top scorers up to
/// the scored share of `target`, plus a floor of most-recent tokens that
/// is always preserved. Ties break toward newer tokens. Returns sorted
/// indices.
pub(crate) fn select_with_recency_floor(scores: &[f64], target: usize) -> Vec<usize> {
    let len = scores.len();
    let recency_budget = MIN_RECENCY_KEEP.max(target / 4).min(len);
    let scored_budget = target.saturating_sub(recency_budget);

    let mut keep = vec![false; len];
    if scored_budget > 0 {
        let mut ranked: Vec<usize> = (0..len).collect();
        ranked.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.cmp(&a))
        });
        for &index in ranked.iter().take(scored_budget) {
            keep[index] = true;
        }
    }
    for flag in keep.iter_mut().skip(len - recency_budget) {
        *flag = true;
    }

    (0..len).filter(|&i| keep[i]).collect()
}
