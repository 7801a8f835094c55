use spool_core::config::{MemoryPolicy, SpoolConfig};
use spool_core::errors::SpoolResult;
use spool_core::models::{ranges_from_indices, RetentionDecision};
use spool_core::traits::ILanguageModel;

use super::select_with_recency_floor;

/// Importance-weighted eviction.
///
/// Scores every buffered token through a three-rung ladder (provider
/// attention, masked-span logit probes, recency ramp), merges the result
/// into the running per-position scores, and keeps the top scorers under
/// budget plus the recency floor.
pub fn decide(
    ids: &[u32],
    n_new: usize,
    config: &SpoolConfig,
    model: &dyn ILanguageModel,
    scores: &mut Vec<f64>,
) -> SpoolResult<RetentionDecision> {
    let len = ids.len();
    if len + n_new <= config.max_tokens {
        return Ok(RetentionDecision::keep_all(MemoryPolicy::Importance, len));
    }

    let observed = importance_scores(model, ids, config.importance_probes, config.span_size);

    // Merge into the running scores: a token keeps the strongest signal
    // it has ever received.
    if scores.len() < len {
        scores.resize(len, 0.0);
    }
    for (running, fresh) in scores.iter_mut().zip(&observed) {
        *running = running.max(*fresh);
    }

    let target = config.max_tokens.saturating_sub(n_new);
    let kept = select_with_recency_floor(&scores[..len], target);
    let evicted = len - kept.len();

    // Reindex the running scores to the surviving positions; the engine
    // pads for the appended tokens afterwards.
    let reindexed: Vec<f64> = kept.iter().map(|&i| scores[i]).collect();
    *scores = reindexed;

    Ok(RetentionDecision {
        policy: MemoryPolicy::Importance,
        keep: ranges_from_indices(&kept),
        summary: None,
        evicted,
        fell_back: false,
    })
}

/// Best available importance signal for each token position.
pub fn importance_scores(
    model: &dyn ILanguageModel,
    ids: &[u32],
    probes: usize,
    span_size: usize,
) -> Vec<f64> {
    if let Some(attention) = model.attention_scores(ids) {
        if attention.len() >= ids.len() {
            return attention[..ids.len()].to_vec();
        }
    }
    if ids.len() > span_size {
        if let Some(probed) = probe_scores(model, ids, probes, span_size) {
            return probed;
        }
    }
    recency_ramp(ids.len())
}

/// Masked-span logit attribution: remove one span at a time and measure
/// the shift in the top next-token log-probability. Probe count is
/// bounded for latency; the impact of each probe is spread across its
/// span and the result max-normalized.
fn probe_scores(
    model: &dyn ILanguageModel,
    ids: &[u32],
    probes: usize,
    span_size: usize,
) -> Option<Vec<f64>> {
    let len = ids.len();
    let baseline = top_logprob(model, ids)?;

    let n_spans = (len / span_size).max(1);
    let probe_count = probes.min(n_spans);
    let mut scores = vec![0.0f64; len];

    for probe in 0..probe_count {
        // Evenly spaced span indices across the buffer.
        let span_index = if probe_count == 1 {
            0
        } else {
            probe * (n_spans - 1) / (probe_count - 1)
        };
        let start = span_index * span_size;
        let end = (start + span_size).min(len);

        let mut masked = Vec::with_capacity(len - (end - start));
        masked.extend_from_slice(&ids[..start]);
        masked.extend_from_slice(&ids[end..]);
        if masked.is_empty() {
            continue;
        }

        let masked_top = top_logprob(model, &masked)?;
        let delta = (baseline - masked_top).abs();
        for score in &mut scores[start..end] {
            *score += delta;
        }
    }

    let max = scores.iter().cloned().fold(0.0f64, f64::max);
    if max > 0.0 {
        for score in &mut scores {
            *score /= max;
        }
    }
    Some(scores)
}

fn top_logprob(model: &dyn ILanguageModel, ids: &[u32]) -> Option<f64> {
    model
        .next_token_logprobs(ids)
        .and_then(|dist| dist.into_iter().reduce(f64::max))
}

/// Position-proportional fallback scores in the 0.3..=1.0 range: newer
/// tokens matter more when no model signal is available.
pub(crate) fn recency_ramp(len: usize) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }
    let denominator = (len - 1).max(1) as f64;
    (0..len)
        .map(|i| 0.3 + 0.7 * i as f64 / denominator)
        .collect()
}
