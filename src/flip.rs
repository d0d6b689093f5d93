use core::ops::Range;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::container::Container;
use crate::util;
use crate::ChunkSet;

impl ChunkSet {
    /// Computes `self XOR [range.start, range.end)`: the values of the range
    /// switch membership, everything else is untouched.
    ///
    /// The bounds are clipped to the `u32` value space; an empty range
    /// yields a plain copy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunkset::ChunkSet;
    ///
    /// let set: ChunkSet = [0, 1, 2].into_iter().collect();
    /// assert_eq!(set.flip(1..4).to_vec(), [0, 3]);
    /// assert_eq!(ChunkSet::new().flip(0..5).to_vec(), [0, 1, 2, 3, 4]);
    /// ```
    pub fn flip(&self, range: Range<u64>) -> ChunkSet {
        let Some((start, end)) = util::clip_range(range) else {
            return self.clone();
        };
        let (key_start, low_start) = util::split(start);
        let (key_end, low_end) = util::split(end);

        let mut containers = Vec::with_capacity(
            self.containers.len() + (key_end - key_start) as usize + 1,
        );

        // Buckets before the range are carried over verbatim.
        let untouched = self.containers.partition_point(|c| c.key < key_start);
        containers.extend(
            self.containers[..untouched].iter().map(|c| c.clone_for(self.copy_on_write)),
        );

        for key in key_start..=key_end {
            let low = if key == key_start { low_start } else { 0 };
            let high = if key == key_end { low_end } else { u16::MAX };
            match self.containers.binary_search_by_key(&key, |c| c.key) {
                Ok(loc) => {
                    let flipped = self.containers[loc].flipped_range(low..=high);
                    if !flipped.is_empty() {
                        containers.push(flipped);
                    }
                }
                Err(_) => containers.push(Container::from_range(key, low..=high)),
            }
        }

        // And so are the buckets after it.
        let rest = self.containers.partition_point(|c| c.key <= key_end);
        containers.extend(
            self.containers[rest..].iter().map(|c| c.clone_for(self.copy_on_write)),
        );

        ChunkSet { containers, copy_on_write: self.copy_on_write }
    }

    /// In-place counterpart of [`ChunkSet::flip`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunkset::ChunkSet;
    ///
    /// let mut set: ChunkSet = [0, 1, 2].into_iter().collect();
    /// set.flip_inplace(1..4);
    /// assert_eq!(set.to_vec(), [0, 3]);
    /// ```
    pub fn flip_inplace(&mut self, range: Range<u64>) {
        let Some((start, end)) = util::clip_range(range) else {
            return;
        };
        let (key_start, low_start) = util::split(start);
        let (key_end, low_end) = util::split(end);

        for key in key_start..=key_end {
            let low = if key == key_start { low_start } else { 0 };
            let high = if key == key_end { low_end } else { u16::MAX };
            match self.containers.binary_search_by_key(&key, |c| c.key) {
                Ok(loc) => {
                    self.containers[loc].flip_range_inplace(low..=high);
                    if self.containers[loc].is_empty() {
                        self.containers.remove(loc);
                    }
                }
                Err(loc) => {
                    self.containers.insert(loc, Container::from_range(key, low..=high))
                }
            }
        }
    }
}
