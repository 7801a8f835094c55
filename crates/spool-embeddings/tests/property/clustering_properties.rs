use proptest::prelude::*;
use spool_embeddings::ClusterState;

fn embeddings_strategy() -> impl Strategy<Value = Vec<Vec<f32>>> {
    (1usize..24).prop_flat_map(|n| {
        prop::collection::vec(
            prop::collection::vec(-10.0f32..10.0, 4..=4),
            n..=n,
        )
    })
}

proptest! {
    #[test]
    fn labels_stay_in_range(embeddings in embeddings_strategy(), k in 1usize..6) {
        let mut state = ClusterState::new();
        let labels = state.fit(&embeddings, k);
        let effective_k = k.min(embeddings.len());
        prop_assert_eq!(labels.len(), embeddings.len());
        prop_assert!(labels.iter().all(|&l| l < effective_k));
    }

    #[test]
    fn deterministic_across_fresh_states(embeddings in embeddings_strategy(), k in 1usize..6) {
        // Seeding is positional, not random: two cold starts over the
        // same vectors must agree exactly.
        let mut a = ClusterState::new();
        let mut b = ClusterState::new();
        prop_assert_eq!(a.fit(&embeddings, k), b.fit(&embeddings, k));
    }

    #[test]
    fn centroid_count_matches_k(embeddings in embeddings_strategy(), k in 1usize..6) {
        let mut state = ClusterState::new();
        state.fit(&embeddings, k);
        prop_assert_eq!(state.centroids().len(), k.min(embeddings.len()));
    }
}
