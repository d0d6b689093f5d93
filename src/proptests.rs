use proptest::prelude::*;

use crate::arbitrary::{chunkset, flip_range};
use crate::ChunkSet;

proptest! {
    #[test]
    fn union_is_commutative(a in chunkset(), b in chunkset()) {
        prop_assert_eq!(&a | &b, &b | &a);
    }

    #[test]
    fn intersection_is_commutative(a in chunkset(), b in chunkset()) {
        prop_assert_eq!(&a & &b, &b & &a);
    }

    #[test]
    fn symmetric_difference_is_commutative(a in chunkset(), b in chunkset()) {
        prop_assert_eq!(&a ^ &b, &b ^ &a);
    }

    #[test]
    fn union_is_associative(a in chunkset(), b in chunkset(), c in chunkset()) {
        prop_assert_eq!(&(&a | &b) | &c, &a | &(&b | &c));
    }

    #[test]
    fn intersection_is_associative(a in chunkset(), b in chunkset(), c in chunkset()) {
        prop_assert_eq!(&(&a & &b) & &c, &a & &(&b & &c));
    }

    #[test]
    fn symmetric_difference_is_associative(a in chunkset(), b in chunkset(), c in chunkset()) {
        prop_assert_eq!(&(&a ^ &b) ^ &c, &a ^ &(&b ^ &c));
    }

    #[test]
    fn union_and_intersection_are_idempotent(a in chunkset()) {
        prop_assert_eq!(&a | &a, a.clone());
        prop_assert_eq!(&a & &a, a);
    }

    #[test]
    fn union_absorbs_intersection(a in chunkset(), b in chunkset()) {
        prop_assert_eq!(&a | &(&a & &b), a);
    }

    #[test]
    fn difference_is_intersection_with_complement(a in chunkset(), b in chunkset()) {
        prop_assert_eq!(&a - &b, &a & &b.flip(0..1 << 32));
    }

    #[test]
    fn flip_is_involutive(a in chunkset(), range in flip_range()) {
        prop_assert_eq!(a.flip(range.clone()).flip(range), a);
    }

    #[test]
    fn flip_inplace_matches_flip(a in chunkset(), range in flip_range()) {
        let mut flipped = a.clone();
        flipped.flip_inplace(range.clone());
        prop_assert_eq!(flipped, a.flip(range));
    }

    #[test]
    fn inplace_ops_match_their_out_of_place_form(a in chunkset(), b in chunkset()) {
        let mut or = a.clone();
        or |= &b;
        prop_assert_eq!(or, &a | &b);

        let mut and = a.clone();
        and &= &b;
        prop_assert_eq!(and, &a & &b);

        let mut xor = a.clone();
        xor ^= &b;
        prop_assert_eq!(xor, &a ^ &b);

        let mut sub = a.clone();
        sub -= &b;
        prop_assert_eq!(sub, &a - &b);
    }

    #[test]
    fn lazy_union_matches_eager_union(a in chunkset(), b in chunkset()) {
        let mut lazy = a.lazy_or(&b);
        lazy.repair_after_lazy();
        prop_assert_eq!(&lazy, &(&a | &b));

        let mut lazy = a.clone();
        lazy.lazy_or_inplace(&b);
        lazy.repair_after_lazy();
        prop_assert_eq!(&lazy, &(&a | &b));
    }

    #[test]
    fn lazy_symmetric_difference_matches_eager(a in chunkset(), b in chunkset()) {
        let mut lazy = a.lazy_xor(&b);
        lazy.repair_after_lazy();
        prop_assert_eq!(&lazy, &(&a ^ &b));

        let mut lazy = a.clone();
        lazy.lazy_xor_inplace(&b);
        lazy.repair_after_lazy();
        prop_assert_eq!(&lazy, &(&a ^ &b));
    }

    #[test]
    fn many_way_unions_agree(sets in proptest::collection::vec(chunkset(), 0..5)) {
        let refs: Vec<&ChunkSet> = sets.iter().collect();
        let folded = sets.iter().fold(ChunkSet::new(), |acc, set| acc | set);
        let linear = ChunkSet::or_many(&refs);
        prop_assert_eq!(&linear, &folded);
        prop_assert_eq!(&linear, &ChunkSet::or_many_heap(&refs));
    }

    #[test]
    fn run_compression_does_not_change_the_values(a in chunkset()) {
        let mut optimized = a.clone();
        optimized.run_optimize();
        prop_assert_eq!(&optimized, &a);
        optimized.remove_run_compression();
        prop_assert_eq!(&optimized, &a);
    }

    #[test]
    fn copy_on_write_is_transparent(a in chunkset(), b in chunkset()) {
        let mut shared_a = a.clone();
        shared_a.set_copy_on_write(true);
        let mut shared_b = b.clone();
        shared_b.set_copy_on_write(true);

        prop_assert_eq!(&shared_a | &shared_b, &a | &b);
        prop_assert_eq!(&shared_a & &shared_b, &a & &b);
        prop_assert_eq!(&shared_a ^ &shared_b, &a ^ &b);
        prop_assert_eq!(&shared_a - &shared_b, &a - &b);

        let mut mutated = shared_a.clone();
        mutated.flip_inplace(0..100);
        let mut expected = a.clone();
        expected.flip_inplace(0..100);
        prop_assert_eq!(mutated, expected);
        prop_assert_eq!(shared_a.clone(), a);
    }

    #[test]
    fn to_vec_is_ascending_and_consistent(a in chunkset()) {
        let values = a.to_vec();
        prop_assert_eq!(values.len() as u64, a.len());
        prop_assert!(values.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert!(values.iter().all(|&value| a.contains(value)));
        prop_assert_eq!(a.min(), values.first().copied());
        prop_assert_eq!(a.max(), values.last().copied());
    }

    #[test]
    fn range_cardinality_matches_filtered_count(a in chunkset(), range in flip_range()) {
        let expected =
            a.iter().filter(|&value| range.contains(&u64::from(value))).count() as u64;
        prop_assert_eq!(a.range_cardinality(range), expected);
    }

    #[test]
    fn clone_equals_original(a in chunkset()) {
        prop_assert_eq!(a.clone(), a);
    }
}
