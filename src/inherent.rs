use crate::container::Container;
use crate::util;
use crate::ChunkSet;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

impl ChunkSet {
    /// Creates an empty `ChunkSet`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunkset::ChunkSet;
    /// let set = ChunkSet::new();
    /// ```
    pub fn new() -> ChunkSet {
        ChunkSet { containers: Vec::new(), copy_on_write: false }
    }

    /// Creates an empty `ChunkSet` with room for `capacity` buckets before
    /// the directory reallocates.
    pub fn with_capacity(capacity: usize) -> ChunkSet {
        ChunkSet { containers: Vec::with_capacity(capacity), copy_on_write: false }
    }

    /// Creates a `ChunkSet` holding `min`, `min + step`, `min + 2·step`, …
    /// for every such value below `max`.
    ///
    /// Returns `None` when `step` is zero or the range is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunkset::ChunkSet;
    ///
    /// let set = ChunkSet::from_range(0, 10, 3).unwrap();
    /// assert_eq!(set.to_vec(), [0, 3, 6, 9]);
    /// assert!(ChunkSet::from_range(10, 10, 1).is_none());
    /// ```
    pub fn from_range(min: u32, max: u32, step: u32) -> Option<ChunkSet> {
        if step == 0 || max <= min {
            return None;
        }
        let mut set = ChunkSet::new();
        if step >= 1 << 16 {
            // Values are at least a bucket apart, nothing to batch.
            let mut value = u64::from(min);
            while value < u64::from(max) {
                set.insert(value as u32);
                value += u64::from(step);
            }
            return Some(set);
        }
        let max = u64::from(max);
        let mut value = u64::from(min);
        while value < max {
            let key = (value >> 16) as u16;
            let bucket_end = ((u64::from(key) << 16) + (1 << 16)).min(max);
            let low = (value & 0xFFFF) as u16;
            let count = (bucket_end - value + u64::from(step) - 1) / u64::from(step);
            let container = if step == 1 {
                Container::from_range(key, low..=(low + (count - 1) as u16))
            } else {
                Container::from_steps(key, low, count as usize, step as u16)
            };
            set.containers.push(container);
            value += count * u64::from(step);
        }
        Some(set)
    }

    /// Adds a value to the set.
    ///
    /// Returns whether the value was absent from the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunkset::ChunkSet;
    ///
    /// let mut set = ChunkSet::new();
    /// assert_eq!(set.insert(3), true);
    /// assert_eq!(set.insert(3), false);
    /// assert_eq!(set.contains(3), true);
    /// ```
    #[inline]
    pub fn insert(&mut self, value: u32) -> bool {
        let (key, index) = util::split(value);
        let container = match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(loc) => &mut self.containers[loc],
            Err(loc) => {
                self.containers.insert(loc, Container::new(key));
                &mut self.containers[loc]
            }
        };
        container.insert(index)
    }

    /// Removes a value from the set. Returns `true` if the value was present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunkset::ChunkSet;
    ///
    /// let mut set = ChunkSet::new();
    /// set.insert(3);
    /// assert_eq!(set.remove(3), true);
    /// assert_eq!(set.remove(3), false);
    /// assert_eq!(set.contains(3), false);
    /// ```
    #[inline]
    pub fn remove(&mut self, value: u32) -> bool {
        let (key, index) = util::split(value);
        match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(loc) => {
                if self.containers[loc].remove(index) {
                    if self.containers[loc].is_empty() {
                        self.containers.remove(loc);
                    }
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Returns `true` if this set contains the specified integer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunkset::ChunkSet;
    ///
    /// let mut set = ChunkSet::new();
    /// set.insert(1);
    /// assert_eq!(set.contains(0), false);
    /// assert_eq!(set.contains(1), true);
    /// ```
    #[inline]
    pub fn contains(&self, value: u32) -> bool {
        let (key, index) = util::split(value);
        match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(loc) => self.containers[loc].contains(index),
            Err(_) => false,
        }
    }

    /// Returns the number of distinct integers added to the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunkset::ChunkSet;
    ///
    /// let mut set = ChunkSet::new();
    /// assert_eq!(set.len(), 0);
    ///
    /// set.insert(3);
    /// set.insert(4);
    /// assert_eq!(set.len(), 2);
    /// ```
    pub fn len(&self) -> u64 {
        self.containers.iter().map(Container::len).sum()
    }

    /// Returns the number of values stored in `[range.start, range.end)`,
    /// without materializing anything.
    ///
    /// The bounds are clipped to the `u32` value space.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunkset::ChunkSet;
    ///
    /// let set: ChunkSet = [1, 2, 3, 70000].into_iter().collect();
    /// assert_eq!(set.range_cardinality(0..3), 2);
    /// assert_eq!(set.range_cardinality(2..1 << 32), 3);
    /// ```
    pub fn range_cardinality(&self, range: core::ops::Range<u64>) -> u64 {
        let Some((start, end)) = util::clip_range(range) else {
            return 0;
        };
        let (key_start, low_start) = util::split(start);
        let (key_end, low_end) = util::split(end);

        let mut count = 0;
        for container in &self.containers {
            if container.key < key_start || container.key > key_end {
                continue;
            }
            let low = if container.key == key_start { low_start } else { 0 };
            let high = if container.key == key_end { low_end } else { u16::MAX };
            count += container.len_in_range(low..=high);
        }
        count
    }

    /// Returns `true` if there are no integers in this set.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Empties this set.
    pub fn clear(&mut self) {
        self.containers.clear();
    }

    /// Returns the minimum value in the set (if the set is non-empty).
    pub fn min(&self) -> Option<u32> {
        self.containers
            .first()
            .and_then(|head| head.min().map(|min| util::join(head.key, min)))
    }

    /// Returns the maximum value in the set (if the set is non-empty).
    pub fn max(&self) -> Option<u32> {
        self.containers
            .last()
            .and_then(|tail| tail.max().map(|max| util::join(tail.key, max)))
    }

    /// Whether clones of this set share container storage until one side
    /// mutates, instead of copying it eagerly.
    pub fn copy_on_write(&self) -> bool {
        self.copy_on_write
    }

    /// Sets the cloning strategy; see [`ChunkSet::copy_on_write`].
    pub fn set_copy_on_write(&mut self, copy_on_write: bool) {
        self.copy_on_write = copy_on_write;
    }

    /// Run-encodes every container for which that is smaller. Returns
    /// whether any container is run-encoded afterwards.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunkset::ChunkSet;
    ///
    /// let mut set: ChunkSet = (0..1000).collect();
    /// assert!(set.run_optimize());
    /// assert_eq!(set.len(), 1000);
    /// ```
    pub fn run_optimize(&mut self) -> bool {
        let mut has_run = false;
        for container in &mut self.containers {
            has_run |= container.optimize();
        }
        has_run
    }

    /// Flattens every run container back to an array or bitmap, even when
    /// run encoding is smaller. Returns whether a change was applied.
    pub fn remove_run_compression(&mut self) -> bool {
        let mut changed = false;
        for container in &mut self.containers {
            changed |= container.remove_run_compression();
        }
        changed
    }
}

impl Default for ChunkSet {
    fn default() -> ChunkSet {
        ChunkSet::new()
    }
}

// The cloning strategy honors the copy-on-write flag: shared handles when it
// is set, deep copies otherwise. Both produce an equal set.
impl Clone for ChunkSet {
    fn clone(&self) -> Self {
        ChunkSet {
            containers: self
                .containers
                .iter()
                .map(|container| container.clone_for(self.copy_on_write))
                .collect(),
            copy_on_write: self.copy_on_write,
        }
    }
}

// Value equality: representations and the copy-on-write flag do not matter.
impl PartialEq for ChunkSet {
    fn eq(&self, other: &Self) -> bool {
        self.containers == other.containers
    }
}
