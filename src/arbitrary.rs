use proptest::prelude::*;

use crate::ChunkSet;

/// Sets mixing scattered values with dense blocks, so all three container
/// representations and both cloning strategies show up.
pub fn chunkset() -> impl Strategy<Value = ChunkSet> {
    (
        proptest::collection::vec(any::<u32>(), 0..100),
        proptest::collection::vec((any::<u32>(), 1u32..8192), 0..3),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(values, blocks, run_encode, copy_on_write)| {
            let mut set = ChunkSet::new();
            set.set_copy_on_write(copy_on_write);
            for value in values {
                set.insert(value);
            }
            for (start, len) in blocks {
                let end = (u64::from(start) + u64::from(len)).min(u64::from(u32::MAX)) as u32;
                if let Some(block) = ChunkSet::from_range(start, end, 1) {
                    set |= &block;
                }
            }
            if run_encode {
                set.run_optimize();
            } else {
                set.remove_run_compression();
            }
            set
        })
}

/// Flip ranges biased toward bucket boundaries.
pub fn flip_range() -> impl Strategy<Value = core::ops::Range<u64>> {
    let bound = prop_oneof![
        any::<u32>().prop_map(u64::from),
        (0u64..8).prop_map(|key| key << 16),
        Just(1u64 << 32),
    ];
    (bound.clone(), bound).prop_map(|(a, b)| a.min(b)..a.max(b))
}
