use chunkset::ChunkSet;

fn round_trip(set: &ChunkSet) -> ChunkSet {
    let mut bytes = Vec::with_capacity(set.serialized_size());
    set.serialize_into(&mut bytes).unwrap();
    assert_eq!(bytes.len(), set.serialized_size());
    ChunkSet::deserialize_from(&bytes[..]).unwrap()
}

#[test]
fn empty_set() {
    assert_eq!(round_trip(&ChunkSet::new()), ChunkSet::new());
}

#[test]
fn array_containers() {
    let set: ChunkSet = [1, 2, 3, 1000, 70_000].into_iter().collect();
    assert_eq!(round_trip(&set), set);
}

#[test]
fn bitmap_containers() {
    let set: ChunkSet = (0..10_000).map(|i| i * 2).collect();
    assert_eq!(round_trip(&set), set);
}

#[test]
fn run_containers() {
    let mut set = ChunkSet::from_range(10, 200_000, 1).unwrap();
    set.run_optimize();
    assert_eq!(round_trip(&set), set);
}

#[test]
fn mixed_containers() {
    let mut set: ChunkSet = [5, 7, 11].into_iter().collect();
    set |= ChunkSet::from_range(1 << 16, (1 << 16) + 50_000, 2).unwrap();
    set |= ChunkSet::from_range(1 << 18, (1 << 18) + 30_000, 1).unwrap();
    set.run_optimize();
    assert_eq!(round_trip(&set), set);

    let mut bytes = vec![];
    set.serialize_into(&mut bytes).unwrap();
    assert_eq!(ChunkSet::deserialize_unchecked_from(&bytes[..]).unwrap(), set);
}

#[test]
fn dense_union_of_a_million_values() {
    let lhs = ChunkSet::from_range(0, 1_500_000, 1).unwrap();
    let rhs = ChunkSet::from_range(500_000, 2_000_000, 1).unwrap();
    let union = &lhs | &rhs;
    assert_eq!(union.len(), 2_000_000);
    assert_eq!(round_trip(&union), union);
}

#[test]
fn values_at_the_top_of_the_key_space() {
    let set: ChunkSet = [0, u32::MAX - 1, u32::MAX].into_iter().collect();
    assert_eq!(round_trip(&set), set);
}

#[test]
fn compact_format_picks_the_smaller_framing() {
    // A handful of scattered values is smaller as a packed u32 array
    let sparse: ChunkSet = [1, 70_000, 140_000].into_iter().collect();
    let bytes = sparse.serialize_compact();
    assert_eq!(bytes.len(), 1 + 4 * sparse.len() as usize);
    assert_eq!(ChunkSet::deserialize_compact(&bytes).unwrap(), sparse);

    // A dense run-encoded set is smaller as containers
    let mut dense = ChunkSet::from_range(0, 1_000_000, 1).unwrap();
    dense.run_optimize();
    let bytes = dense.serialize_compact();
    assert_eq!(bytes.len(), 5 + dense.serialized_size());
    assert_eq!(ChunkSet::deserialize_compact(&bytes).unwrap(), dense);
}

#[test]
fn compact_format_rejects_garbage() {
    assert!(ChunkSet::deserialize_compact(&[]).is_err());
    assert!(ChunkSet::deserialize_compact(&[9, 1, 2, 3]).is_err());
    // Truncated value array
    assert!(ChunkSet::deserialize_compact(&[1, 1, 2, 3]).is_err());
    // Length header disagrees with the buffer
    assert!(ChunkSet::deserialize_compact(&[2, 0xFF, 0, 0, 0]).is_err());
}

#[test]
fn portable_format_rejects_garbage() {
    assert!(ChunkSet::deserialize_from(&[][..]).is_err());
    assert!(ChunkSet::deserialize_from(&[1, 2, 3][..]).is_err());
    assert!(ChunkSet::deserialize_from(&[0xDE, 0xAD, 0xBE, 0xEF, 1, 0, 0, 0][..]).is_err());

    let set: ChunkSet = (0..100).collect();
    let mut bytes = vec![];
    set.serialize_into(&mut bytes).unwrap();
    assert!(ChunkSet::deserialize_from(&bytes[..bytes.len() - 1]).is_err());

    // Corrupt the first value's high byte so the array is out of order
    bytes[17] ^= 0xFF;
    assert!(ChunkSet::deserialize_from(&bytes[..]).is_err());
}

#[test]
fn portable_format_rejects_cardinality_mismatch() {
    let set: ChunkSet = (0..5_000).collect();
    let mut bytes = vec![];
    set.serialize_into(&mut bytes).unwrap();

    // Flip a byte of the bitmap body; the declared cardinality no longer
    // matches the bits
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    assert!(ChunkSet::deserialize_from(&bytes[..]).is_err());
}

#[test]
fn deserialized_sets_start_without_copy_on_write() {
    let mut set: ChunkSet = [1, 2, 3].into_iter().collect();
    set.set_copy_on_write(true);
    let mut bytes = vec![];
    set.serialize_into(&mut bytes).unwrap();
    assert!(!ChunkSet::deserialize_from(&bytes[..]).unwrap().copy_on_write());
}
