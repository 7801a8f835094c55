use crate::errors::SpoolResult;

/// Generation/tokenization provider.
///
/// `attention_scores` and `next_token_logprobs` are optional capabilities:
/// providers without them return `None` and the importance policy degrades
/// to its probe or recency ladder.
pub trait ILanguageModel: Send + Sync {
    /// Encode text to token ids.
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Decode token ids to text.
    fn decode(&self, tokens: &[u32]) -> SpoolResult<String>;

    /// Generate up to `max_new_tokens` continuation tokens for the prompt.
    /// Returns only the newly generated ids.
    fn generate(&self, prompt: &[u32], max_new_tokens: usize) -> SpoolResult<Vec<u32>>;

    /// Last-layer attention weight per prompt token, if the provider
    /// exposes one.
    fn attention_scores(&self, _tokens: &[u32]) -> Option<Vec<f64>> {
        None
    }

    /// Next-token log-probability distribution for the prompt, if the
    /// provider exposes one. Used by the importance policy's masked-span
    /// probe when attention is unavailable.
    fn next_token_logprobs(&self, _tokens: &[u32]) -> Option<Vec<f64>> {
        None
    }

    /// Human-readable provider name.
    fn name(&self) -> &str;
}
