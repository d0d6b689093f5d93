use chunkset::ChunkSet;

#[test]
fn run_optimize_keeps_the_value_set() {
    let before = ChunkSet::from_range(0, 131_072, 1).unwrap();
    let mut set = before.clone();

    assert!(set.run_optimize());
    assert_eq!(set.len(), 131_072);
    assert_eq!(set, before);
}

#[test]
fn run_optimize_compresses_dense_inserts() {
    // Built value by value, the buckets start out as arrays and bitmaps
    let mut set = ChunkSet::new();
    for value in 0..70_000 {
        set.insert(value);
    }
    let before = set.clone();

    assert!(set.run_optimize());
    assert_eq!(set, before);

    assert!(set.remove_run_compression());
    assert_eq!(set, before);
    assert!(!set.remove_run_compression());
}

#[test]
fn run_optimize_leaves_scattered_values_alone() {
    let mut set = ChunkSet::new();
    for value in (0..8_000).step_by(2) {
        set.insert(value);
    }
    // Alternating values compress worse as runs than as an array or bitmap
    assert!(!set.run_optimize());
    assert!(!set.remove_run_compression());
    assert_eq!(set.len(), 4_000);
}

#[test]
fn mutations_after_run_optimize_keep_working() {
    let mut set = ChunkSet::from_range(1000, 2000, 1).unwrap();
    set.run_optimize();

    set.insert(5000);
    set.remove(1500);
    assert!(set.contains(1000));
    assert!(!set.contains(1500));
    assert!(set.contains(5000));
    assert_eq!(set.len(), 1000);

    let other = ChunkSet::from_range(1500, 2500, 1).unwrap();
    let union = &set | &other;
    assert_eq!(union.len(), 1501);
}
