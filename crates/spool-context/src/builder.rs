use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::trace;

use spool_core::errors::SpoolResult;
use spool_core::traits::ILanguageModel;

/// Characters that terminate a sentence for anchoring purposes.
const SENTENCE_BOUNDARIES: [char; 4] = ['.', '!', '?', '\n'];

/// Deterministic context selection that any model will respect.
///
/// Strategy: always keep the recent tail window, preserve global anchors
/// at sentence boundaries, and if the result is still over the limit,
/// trim from the oldest anchor forward. Boundary indices are cached per
/// token window (content-hashed, bounded LRU) so an unchanged window is
/// a single lookup instead of a token-by-token decode.
pub struct ContextBuilder {
    window_size: usize,
    anchor_cache: LruCache<blake3::Hash, Vec<usize>>,
    cache_hits: u64,
}

impl ContextBuilder {
    pub fn new(window_size: usize, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            window_size,
            anchor_cache: LruCache::new(capacity),
            cache_hits: 0,
        }
    }

    /// Assemble a context of at most `max_tokens` from the retained
    /// tokens.
    ///
    /// Returns the final token sequence and the number of anchor-cache
    /// hits this call scored.
    pub fn build(
        &mut self,
        model: &dyn ILanguageModel,
        tokens: &[u32],
        max_tokens: usize,
    ) -> SpoolResult<(Vec<u32>, u64)> {
        if tokens.len() <= max_tokens {
            return Ok((tokens.to_vec(), 0));
        }

        let hits_before = self.cache_hits;
        let anchors = self.boundaries(model, tokens);
        let hits = self.cache_hits - hits_before;

        let mut keep = vec![false; tokens.len()];
        // 1) The recent window survives verbatim.
        let window_start = tokens.len().saturating_sub(self.window_size);
        for flag in &mut keep[window_start..] {
            *flag = true;
        }
        // 2) Sentence anchors survive.
        for &anchor in &anchors {
            if anchor < tokens.len() {
                keep[anchor] = true;
            }
        }

        let mut kept: Vec<usize> = (0..tokens.len()).filter(|&i| keep[i]).collect();
        // Still over budget: drop the oldest anchors first.
        if kept.len() > max_tokens {
            kept.drain(..kept.len() - max_tokens);
        }

        let context: Vec<u32> = kept.into_iter().map(|i| tokens[i]).collect();
        trace!(
            input = tokens.len(),
            output = context.len(),
            anchors = anchors.len(),
            "context assembled"
        );
        Ok((context, hits))
    }

    /// Sentence-boundary token indices for a window, cached by content.
    fn boundaries(&mut self, model: &dyn ILanguageModel, tokens: &[u32]) -> Vec<usize> {
        let key = hash_window(tokens);
        if let Some(cached) = self.anchor_cache.get(&key) {
            self.cache_hits += 1;
            return cached.clone();
        }

        let mut indices = vec![0];
        for (i, &token) in tokens.iter().enumerate().take(tokens.len().saturating_sub(1)) {
            if let Ok(piece) = model.decode(&[token]) {
                if piece.contains(SENTENCE_BOUNDARIES) {
                    indices.push(i + 1);
                }
            }
        }
        if !tokens.is_empty() {
            indices.push(tokens.len() - 1);
        }
        indices.sort_unstable();
        indices.dedup();

        self.anchor_cache.put(key, indices.clone());
        indices
    }

    /// Total anchor-cache hits over the builder's lifetime.
    pub fn total_cache_hits(&self) -> u64 {
        self.cache_hits
    }

    /// Drop all cached boundaries.
    pub fn reset(&mut self) {
        self.anchor_cache.clear();
        self.cache_hits = 0;
    }
}

fn hash_window(tokens: &[u32]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for token in tokens {
        hasher.update(&token.to_le_bytes());
    }
    hasher.finalize()
}
