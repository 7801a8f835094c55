use tracing::{debug, warn};

use spool_core::config::{MemoryPolicy, SpoolConfig};
use spool_core::errors::SpoolResult;
use spool_core::models::{MemoryStats, RetentionDecision, SpanRange};
use spool_core::traits::ILanguageModel;

use crate::qa_gate::SummaryQAGate;

/// Rolling-summary bookkeeping carried between turns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryState {
    /// Accumulated summary prefix, spliced ahead of the recent half on
    /// every compaction.
    pub summary_tokens: Vec<u32>,
    /// Tokens appended since the last compaction.
    pub tokens_since_summary: usize,
}

/// Rolling-summary eviction.
///
/// Once the un-summarized tail exceeds `summary_interval`, the older
/// half of the buffer is condensed into a short verified summary and
/// spliced in its place. A summary that fails the fact gate is retried
/// once with a stricter verbatim extraction; if that also fails, the
/// span is plainly truncated; an unverified summary is never spliced.
pub fn decide(
    ids: &[u32],
    n_new: usize,
    config: &SpoolConfig,
    model: &dyn ILanguageModel,
    gate: &SummaryQAGate,
    state: &mut SummaryState,
    stats: &mut MemoryStats,
) -> SpoolResult<RetentionDecision> {
    state.tokens_since_summary += n_new;
    let len = ids.len();

    let due = state.tokens_since_summary >= config.summary_interval
        && len > config.summary_interval;
    if !due {
        return Ok(RetentionDecision::keep_all(MemoryPolicy::RollingSummary, len));
    }

    let cutoff = len / 2;
    let budget = (config.max_tokens / 8).min(128).max(1);
    let summary = condense(model, gate, &ids[..cutoff], budget, stats);

    // Splice: accumulated prefix + fresh summary replace the older half.
    let mut prefix = state.summary_tokens.clone();
    prefix.extend(&summary);
    state.summary_tokens.extend(&summary);
    state.tokens_since_summary = 0;

    // Keep the accumulated prefix itself bounded.
    if state.summary_tokens.len() > config.max_tokens / 4 {
        let recompact_budget = (config.max_tokens / 8).max(1);
        state.summary_tokens = condense(
            model,
            gate,
            &state.summary_tokens.clone(),
            recompact_budget,
            stats,
        );
    }

    debug!(
        summarized = cutoff,
        summary_len = summary.len(),
        "rolling summary compaction"
    );

    Ok(RetentionDecision {
        policy: MemoryPolicy::RollingSummary,
        keep: vec![SpanRange::new(cutoff, len)],
        summary: Some(prefix),
        // The summarized half is replaced, not evicted; only the
        // bounded-buffer overflow on append counts as eviction.
        evicted: 0,
        fell_back: false,
    })
}

/// Condense a token span into at most `budget` tokens.
///
/// First attempt is a lead-sentence extraction checked by the gate;
/// the retry is a verbatim prefix checked strictly (a prefix cannot
/// fabricate); the last resort is plain token truncation.
fn condense(
    model: &dyn ILanguageModel,
    gate: &SummaryQAGate,
    source_ids: &[u32],
    budget: usize,
    stats: &mut MemoryStats,
) -> Vec<u32> {
    if source_ids.is_empty() {
        return Vec::new();
    }

    let text = match model.decode(source_ids) {
        Ok(text) => text,
        Err(error) => {
            warn!(%error, "decode failed during summarization; truncating");
            return source_ids[..budget.min(source_ids.len())].to_vec();
        }
    };

    let candidate = lead_sentence(&text, 200);
    if gate.verify(&text, &candidate) {
        stats.summaries_created += 1;
        let mut encoded = model.encode(&candidate);
        encoded.truncate(budget);
        return encoded;
    }

    // Stricter extraction: a verbatim prefix preserves source order and
    // cannot introduce facts, so only the fidelity threshold can fail it.
    let prefix: String = text.chars().take(budget * 4).collect();
    let strict_gate = SummaryQAGate::strict(gate.threshold);
    if strict_gate.verify(&text, &prefix) {
        stats.summaries_created += 1;
        let mut encoded = model.encode(&prefix);
        encoded.truncate(budget);
        return encoded;
    }

    warn!("summary failed verification twice; truncating source span");
    source_ids[..budget.min(source_ids.len())].to_vec()
}

/// First sentence of the text, capped at `max_chars`.
fn lead_sentence(text: &str, max_chars: usize) -> String {
    let sentence = text.split('.').next().unwrap_or(text);
    let base = if sentence.trim().is_empty() {
        text
    } else {
        sentence
    };
    base.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use spool_core::errors::SpoolError;

    /// Round-trip model: each id maps to a fixed word and back.
    struct WordModel;

    const WORDS: &[&str] = &["alpha", "beta", "gamma", "delta", "epsilon"];

    impl ILanguageModel for WordModel {
        fn encode(&self, text: &str) -> Vec<u32> {
            text.split_whitespace()
                .filter_map(|w| {
                    let trimmed = w.trim_end_matches('.');
                    WORDS.iter().position(|&k| k == trimmed).map(|i| i as u32)
                })
                .collect()
        }

        fn decode(&self, tokens: &[u32]) -> SpoolResult<String> {
            Ok(tokens
                .iter()
                .map(|&t| WORDS[t as usize % WORDS.len()])
                .collect::<Vec<_>>()
                .join(" "))
        }

        fn generate(&self, _prompt: &[u32], _max_new_tokens: usize) -> SpoolResult<Vec<u32>> {
            Err(SpoolError::provider("word-model", "generation unsupported"))
        }

        fn name(&self) -> &str {
            "word-model"
        }
    }

    fn config() -> SpoolConfig {
        SpoolConfig {
            max_tokens: 64,
            window_size: 16,
            summary_interval: 16,
            ..Default::default()
        }
    }

    #[test]
    fn below_interval_keeps_everything() {
        let mut state = SummaryState::default();
        let mut stats = MemoryStats::default();
        let ids: Vec<u32> = (0..10).map(|i| i % 5).collect();
        let decision = decide(
            &ids,
            4,
            &config(),
            &WordModel,
            &SummaryQAGate::default(),
            &mut state,
            &mut stats,
        )
        .unwrap();
        assert_eq!(decision.kept_len(), 10);
        assert!(decision.summary.is_none());
        assert_eq!(state.tokens_since_summary, 4);
    }

    #[test]
    fn interval_reached_splices_summary_for_older_half() {
        let mut state = SummaryState::default();
        let mut stats = MemoryStats::default();
        let ids: Vec<u32> = (0..40).map(|i| i % 5).collect();
        let decision = decide(
            &ids,
            20,
            &config(),
            &WordModel,
            &SummaryQAGate::default(),
            &mut state,
            &mut stats,
        )
        .unwrap();

        assert_eq!(decision.keep, vec![SpanRange::new(20, 40)]);
        let summary = decision.summary.as_ref().unwrap();
        assert!(!summary.is_empty());
        assert!(summary.len() <= 8, "summary over budget: {}", summary.len());
        assert_eq!(stats.summaries_created, 1);
        assert_eq!(state.tokens_since_summary, 0);
        assert_eq!(decision.evicted, 0);
    }

    #[test]
    fn accumulated_prefix_grows_across_compactions() {
        let mut state = SummaryState::default();
        let mut stats = MemoryStats::default();
        let ids: Vec<u32> = (0..40).map(|i| i % 5).collect();
        let gate = SummaryQAGate::default();

        decide(&ids, 20, &config(), &WordModel, &gate, &mut state, &mut stats).unwrap();
        let after_first = state.summary_tokens.len();
        assert!(after_first > 0);

        decide(&ids, 20, &config(), &WordModel, &gate, &mut state, &mut stats).unwrap();
        assert!(state.summary_tokens.len() >= after_first);
        assert_eq!(stats.summaries_created, 2);
    }
}
