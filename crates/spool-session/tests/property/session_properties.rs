use std::sync::Arc;

use proptest::prelude::*;
use spool_core::config::{MemoryPolicy, SpoolConfig};
use spool_core::errors::SpoolResult;
use spool_core::traits::ILanguageModel;
use spool_session::Session;

struct DigitModel;

impl ILanguageModel for DigitModel {
    fn encode(&self, text: &str) -> Vec<u32> {
        text.split_whitespace()
            .filter_map(|w| w.parse().ok())
            .collect()
    }

    fn decode(&self, tokens: &[u32]) -> SpoolResult<String> {
        Ok(tokens
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn generate(&self, _prompt: &[u32], max_new_tokens: usize) -> SpoolResult<Vec<u32>> {
        Ok(vec![1; max_new_tokens.min(3)])
    }

    fn name(&self) -> &str {
        "digit-model"
    }
}

fn session(policy: MemoryPolicy, max_tokens: usize, window_size: usize) -> Session {
    let config = SpoolConfig {
        memory_policy: policy,
        max_tokens,
        window_size,
        ..Default::default()
    };
    Session::new(config, Arc::new(DigitModel), None).unwrap()
}

proptest! {
    #[test]
    fn sliding_conservation_law_holds(
        capacity in 8usize..64,
        batches in prop::collection::vec(prop::collection::vec(any::<u32>(), 0..20), 1..25),
    ) {
        let window = (capacity / 4).max(1);
        let mut s = session(MemoryPolicy::Sliding, capacity, window);
        for batch in batches {
            s.submit(&batch);
            let stats = s.stats();
            prop_assert_eq!(stats.tokens_retained + stats.evictions, stats.tokens_seen);
            prop_assert!(s.buffer_len() <= capacity);
        }
    }

    #[test]
    fn importance_never_exceeds_capacity(
        capacity in 8usize..64,
        batches in prop::collection::vec(prop::collection::vec(any::<u32>(), 1..16), 1..20),
    ) {
        let window = (capacity / 4).max(1);
        let mut s = session(MemoryPolicy::Importance, capacity, window);
        for batch in batches {
            s.submit(&batch);
            let stats = s.stats();
            prop_assert!(s.buffer_len() <= capacity);
            prop_assert!(stats.tokens_retained <= stats.tokens_seen);
        }
    }

    #[test]
    fn built_context_never_exceeds_budget(
        capacity in 8usize..64,
        budget in 1usize..64,
        batches in prop::collection::vec(prop::collection::vec(any::<u32>(), 1..16), 1..15),
    ) {
        let window = (capacity / 4).max(1);
        let mut s = session(MemoryPolicy::Sliding, capacity, window);
        for batch in batches {
            s.submit(&batch);
        }
        let (context, _) = s.build_context(budget).unwrap();
        prop_assert!(context.len() <= budget);
    }
}
