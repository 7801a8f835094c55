use proptest::prelude::*;
use spool_buffer::TokenBuffer;
use spool_core::models::TokenRecord;

#[derive(Debug, Clone)]
enum Op {
    Append(Vec<u32>),
    EvictFront(usize),
    Retain(Vec<usize>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop::collection::vec(any::<u32>(), 0..40).prop_map(Op::Append),
        (0usize..40).prop_map(Op::EvictFront),
        prop::collection::btree_set(0usize..64, 0..32)
            .prop_map(|set| Op::Retain(set.into_iter().collect())),
    ]
}

proptest! {
    #[test]
    fn len_never_exceeds_capacity(
        capacity in 1usize..64,
        ops in prop::collection::vec(op_strategy(), 0..30),
    ) {
        let mut buf = TokenBuffer::new(capacity);
        for op in ops {
            match op {
                Op::Append(ids) => {
                    buf.append(ids.into_iter().map(|id| TokenRecord::new(id, 0)));
                }
                Op::EvictFront(n) => {
                    buf.evict_front(n);
                }
                Op::Retain(indices) => {
                    buf.retain_indices(&indices);
                }
            }
            prop_assert!(buf.len() <= capacity);
        }
    }

    #[test]
    fn append_accounts_for_every_token(
        capacity in 1usize..64,
        batches in prop::collection::vec(prop::collection::vec(any::<u32>(), 0..20), 1..10),
    ) {
        let mut buf = TokenBuffer::new(capacity);
        let mut seen = 0usize;
        let mut dropped = 0usize;
        for batch in batches {
            seen += batch.len();
            dropped += buf.append(batch.into_iter().map(|id| TokenRecord::new(id, 0)));
            prop_assert_eq!(buf.len() + dropped, seen);
        }
    }

    #[test]
    fn retain_preserves_relative_order(
        ids in prop::collection::vec(any::<u32>(), 1..50),
        raw_keep in prop::collection::btree_set(0usize..50, 0..25),
    ) {
        let mut buf = TokenBuffer::new(ids.len());
        buf.append(ids.iter().map(|&id| TokenRecord::new(id, 0)));
        let keep: Vec<usize> = raw_keep.into_iter().filter(|&i| i < ids.len()).collect();
        let expected: Vec<u32> = keep.iter().map(|&i| ids[i]).collect();
        buf.retain_indices(&keep);
        prop_assert_eq!(buf.ids(), expected);
    }
}
