use proptest::prelude::*;
use spool_policy::{choose_under_budget, choose_under_budget_exact, BudgetItem};

fn items_strategy() -> impl Strategy<Value = Vec<BudgetItem>> {
    prop::collection::vec((1usize..12, 0.0f64..10.0), 1..10).prop_map(|raw| {
        let mut start = 0;
        raw.into_iter()
            .enumerate()
            .map(|(index, (size, value))| {
                let item = BudgetItem::new(index, start, start + size, value);
                start += size;
                item
            })
            .collect()
    })
}

fn total_size(items: &[BudgetItem], selected: &[usize]) -> usize {
    selected.iter().map(|&i| items[i].size()).sum()
}

fn total_value(items: &[BudgetItem], selected: &[usize]) -> f64 {
    selected.iter().map(|&i| items[i].value).sum()
}

/// Brute-force optimum over all subsets; instances are kept small enough
/// for this to be exact ground truth.
fn brute_force_optimum(items: &[BudgetItem], budget: usize) -> f64 {
    let n = items.len();
    let mut best = 0.0f64;
    for mask in 0u32..(1 << n) {
        let mut size = 0;
        let mut value = 0.0;
        for (i, item) in items.iter().enumerate() {
            if mask & (1 << i) != 0 {
                size += item.size();
                value += item.value;
            }
        }
        if size <= budget && value > best {
            best = value;
        }
    }
    best
}

proptest! {
    #[test]
    fn both_modes_respect_budget(items in items_strategy(), budget in 0usize..60) {
        let greedy = choose_under_budget(&items, budget);
        let exact = choose_under_budget_exact(&items, budget);
        prop_assert!(total_size(&items, &greedy) <= budget);
        prop_assert!(total_size(&items, &exact) <= budget);
    }

    #[test]
    fn exact_matches_brute_force(items in items_strategy(), budget in 0usize..60) {
        let exact = choose_under_budget_exact(&items, budget);
        let optimum = brute_force_optimum(&items, budget);
        let achieved = total_value(&items, &exact);
        prop_assert!((achieved - optimum).abs() < 1e-9,
            "exact {achieved} vs brute force {optimum}");
    }

    #[test]
    fn exact_dominates_greedy(items in items_strategy(), budget in 0usize..60) {
        let greedy = total_value(&items, &choose_under_budget(&items, budget));
        let exact = total_value(&items, &choose_under_budget_exact(&items, budget));
        prop_assert!(greedy <= exact + 1e-9);
    }

    #[test]
    fn greedy_within_half_of_optimum_plus_best_item(
        items in items_strategy(),
        budget in 1usize..60,
    ) {
        // Classic bound: density-greedy plus the single best feasible
        // item is at least half the 0/1 optimum. The greedy alone can be
        // arbitrarily bad only when one big item beats many dense ones.
        let greedy = total_value(&items, &choose_under_budget(&items, budget));
        let best_single = items
            .iter()
            .filter(|item| item.size() <= budget)
            .map(|item| item.value)
            .fold(0.0f64, f64::max);
        let optimum = brute_force_optimum(&items, budget);
        prop_assert!(greedy.max(best_single) * 2.0 + 1e-9 >= optimum);
    }

    #[test]
    fn selections_are_sorted_and_unique(items in items_strategy(), budget in 0usize..60) {
        for selected in [
            choose_under_budget(&items, budget),
            choose_under_budget_exact(&items, budget),
        ] {
            prop_assert!(selected.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(selected.iter().all(|&i| i < items.len()));
        }
    }
}
