use chunkset::ChunkSet;

fn of(values: &[u32]) -> ChunkSet {
    values.iter().copied().collect()
}

#[test]
fn clones_are_equal_either_way() {
    for copy_on_write in [false, true] {
        let mut set = of(&[1, 2, 3, 70_000, 140_000]);
        set.set_copy_on_write(copy_on_write);
        let clone = set.clone();
        assert_eq!(clone, set);
        assert_eq!(clone.copy_on_write(), copy_on_write);
    }
}

#[test]
fn mutating_a_shared_clone_leaves_the_original_alone() {
    let mut original = ChunkSet::from_range(0, 100_000, 1).unwrap();
    original.set_copy_on_write(true);

    let mut clone = original.clone();
    clone.insert(200_000);
    clone.remove(5);
    clone.flip_inplace(10..20);

    assert_eq!(original, ChunkSet::from_range(0, 100_000, 1).unwrap());
    assert!(original.contains(5));
    assert!(original.contains(15));
    assert!(!original.contains(200_000));
}

#[test]
fn mutating_the_original_leaves_shared_clones_alone() {
    let mut original = of(&[1, 2, 3]);
    original.set_copy_on_write(true);
    let clone = original.clone();

    original.insert(4);
    original &= &of(&[2, 3, 4]);

    assert_eq!(clone, of(&[1, 2, 3]));
    assert_eq!(original, of(&[2, 3, 4]));
}

#[test]
fn operations_mix_flags_freely() {
    let mut shared = ChunkSet::from_range(0, 10_000, 1).unwrap();
    shared.set_copy_on_write(true);
    let mut plain = ChunkSet::from_range(5_000, 15_000, 1).unwrap();
    plain.set_copy_on_write(false);

    let expected_union: ChunkSet = (0..15_000).collect();
    let expected_intersection: ChunkSet = (5_000..10_000).collect();

    assert_eq!(&shared | &plain, expected_union);
    assert_eq!(&plain | &shared, expected_union);
    assert_eq!(&shared & &plain, expected_intersection);
    assert_eq!(&plain - &shared, (10_000..15_000).collect::<ChunkSet>());

    // The result of a combinator only shares when both sides do
    assert!(!(&shared | &plain).copy_on_write());
    let mut also_shared = plain.clone();
    also_shared.set_copy_on_write(true);
    assert!((&shared | &also_shared).copy_on_write());
}

#[test]
fn lazy_union_respects_sharing() {
    let mut lhs = ChunkSet::from_range(0, 70_000, 1).unwrap();
    lhs.set_copy_on_write(true);
    let rhs = of(&[100_000]);

    let mut lazy = lhs.lazy_or(&rhs);
    lazy.repair_after_lazy();
    lazy.insert(100_001);
    lazy.remove(0);

    assert!(lhs.contains(0));
    assert!(!lhs.contains(100_000));
    assert_eq!(lhs.len(), 70_000);
}

#[test]
fn flip_shares_untouched_buckets() {
    let mut set = ChunkSet::from_range(0, 200_000, 1).unwrap();
    set.set_copy_on_write(true);

    let mut flipped = set.flip(70_000..70_010);
    assert_eq!(flipped.len(), 200_000 - 10);
    flipped.flip_inplace(70_000..70_010);
    assert_eq!(flipped, set);

    // The original was never touched
    assert_eq!(set, ChunkSet::from_range(0, 200_000, 1).unwrap());
}
