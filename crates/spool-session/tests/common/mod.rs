//! Shared mock providers for session integration tests.

use std::sync::Arc;

use spool_core::errors::SpoolResult;
use spool_core::traits::{IEmbeddingProvider, ILanguageModel};

/// Deterministic word-level model.
///
/// `w<k>` encodes to token `k`, `.` to token 0, anything else to its
/// character length. Decoding inverts that, so token 0 carries the
/// sentence boundary the context builder anchors on.
pub struct MockModel;

impl ILanguageModel for MockModel {
    fn encode(&self, text: &str) -> Vec<u32> {
        text.split_whitespace()
            .map(|word| {
                if word == "." {
                    0
                } else if let Some(id) = word.strip_prefix('w').and_then(|n| n.parse().ok()) {
                    id
                } else {
                    word.len() as u32
                }
            })
            .collect()
    }

    fn decode(&self, tokens: &[u32]) -> SpoolResult<String> {
        Ok(tokens
            .iter()
            .map(|&t| {
                if t == 0 {
                    ".".to_string()
                } else {
                    format!("w{t}")
                }
            })
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn generate(&self, _prompt: &[u32], max_new_tokens: usize) -> SpoolResult<Vec<u32>> {
        Ok((1..=max_new_tokens.min(5) as u32).collect())
    }

    fn name(&self) -> &str {
        "mock-model"
    }
}

/// Deterministic embedder: simple surface statistics of the text.
pub struct MockEmbedder;

impl IEmbeddingProvider for MockEmbedder {
    fn encode_batch(&self, texts: &[String]) -> SpoolResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let words = t.split_whitespace().count() as f32;
                let letters = t.chars().filter(|c| c.is_alphabetic()).count() as f32;
                let digits = t.chars().filter(|c| c.is_numeric()).count() as f32;
                vec![words, letters, digits, t.len() as f32]
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        4
    }

    fn name(&self) -> &str {
        "mock-embedder"
    }
}

pub fn model() -> Arc<MockModel> {
    Arc::new(MockModel)
}

pub fn embedder() -> Arc<MockEmbedder> {
    Arc::new(MockEmbedder)
}

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
