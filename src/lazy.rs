use alloc::borrow::Cow;
use alloc::collections::BinaryHeap;
use core::cmp::{Ordering, Reverse};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::ops::Pairs;
use crate::ChunkSet;

impl ChunkSet {
    /// An union whose dense result containers defer their cardinality and
    /// representation choice.
    ///
    /// The result must not be read before [`ChunkSet::repair_after_lazy`]
    /// ran on it; afterwards it is indistinguishable from `self | other`.
    /// Chaining several unions this way skips the per-word bookkeeping of
    /// every intermediate step.
    pub fn lazy_or(&self, other: &ChunkSet) -> ChunkSet {
        let mut containers =
            Vec::with_capacity(self.containers.len() + other.containers.len());

        for pair in Pairs::new(&self.containers, &other.containers) {
            match pair {
                (Some(lhs), None) => containers.push(lhs.clone_for(self.copy_on_write)),
                (None, Some(rhs)) => containers.push(rhs.clone_for(other.copy_on_write)),
                (Some(lhs), Some(rhs)) => containers.push(lhs.lazy_bitor(rhs)),
                (None, None) => break,
            }
        }

        ChunkSet { containers, copy_on_write: self.copy_on_write && other.copy_on_write }
    }

    /// In-place counterpart of [`ChunkSet::lazy_or`].
    pub fn lazy_or_inplace(&mut self, other: &ChunkSet) {
        if other.containers.is_empty() {
            return;
        }
        if self.containers.is_empty() {
            self.containers = other
                .containers
                .iter()
                .map(|container| container.clone_for(other.copy_on_write))
                .collect();
            return;
        }
        for container in &other.containers {
            match self.containers.binary_search_by_key(&container.key, |c| c.key) {
                Err(loc) => {
                    self.containers.insert(loc, container.clone_for(other.copy_on_write))
                }
                Ok(loc) => self.containers[loc].lazy_bitor_assign(container),
            }
        }
    }

    /// Symmetric-difference twin of [`ChunkSet::lazy_or`]: dense result
    /// containers defer their cardinality, and buckets cancelled out by the
    /// operation linger until [`ChunkSet::repair_after_lazy`] prunes them.
    pub fn lazy_xor(&self, other: &ChunkSet) -> ChunkSet {
        let mut containers =
            Vec::with_capacity(self.containers.len() + other.containers.len());

        for pair in Pairs::new(&self.containers, &other.containers) {
            match pair {
                (Some(lhs), None) => containers.push(lhs.clone_for(self.copy_on_write)),
                (None, Some(rhs)) => containers.push(rhs.clone_for(other.copy_on_write)),
                (Some(lhs), Some(rhs)) => containers.push(lhs.lazy_bitxor(rhs)),
                (None, None) => break,
            }
        }

        ChunkSet { containers, copy_on_write: self.copy_on_write && other.copy_on_write }
    }

    /// In-place counterpart of [`ChunkSet::lazy_xor`].
    pub fn lazy_xor_inplace(&mut self, other: &ChunkSet) {
        for container in &other.containers {
            match self.containers.binary_search_by_key(&container.key, |c| c.key) {
                Err(loc) => {
                    self.containers.insert(loc, container.clone_for(other.copy_on_write))
                }
                Ok(loc) => self.containers[loc].lazy_bitxor_assign(container),
            }
        }
    }

    /// Recounts every deferred cardinality, re-chooses representations and
    /// drops buckets a lazy operation emptied. The contract of the lazy
    /// operations: after this pass the set is equal, container for container,
    /// to one produced by the eager operations.
    pub fn repair_after_lazy(&mut self) {
        self.containers.retain_mut(|container| {
            container.repair();
            !container.is_empty()
        });
    }

    /// Computes the union of all the given sets.
    ///
    /// The sets are folded together with lazy unions and repaired once at
    /// the end.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chunkset::ChunkSet;
    ///
    /// let a: ChunkSet = [1, 2].into_iter().collect();
    /// let b: ChunkSet = [2, 3].into_iter().collect();
    /// let c: ChunkSet = [70000].into_iter().collect();
    ///
    /// assert_eq!(ChunkSet::or_many(&[&a, &b, &c]).to_vec(), [1, 2, 3, 70000]);
    /// ```
    pub fn or_many(sets: &[&ChunkSet]) -> ChunkSet {
        match sets {
            [] => ChunkSet::new(),
            [only] => (*only).clone(),
            [first, second, rest @ ..] => {
                let mut answer = first.lazy_or(second);
                for set in rest {
                    answer.lazy_or_inplace(set);
                }
                answer.repair_after_lazy();
                answer
            }
        }
    }

    /// Computes the union of all the given sets, smallest pair first.
    ///
    /// A min-heap keyed by cardinality keeps the intermediate unions small.
    /// Ties break on the position in `sets`, so the result is deterministic
    /// and always equals [`ChunkSet::or_many`].
    pub fn or_many_heap(sets: &[&ChunkSet]) -> ChunkSet {
        struct Entry<'a> {
            len: u64,
            seq: usize,
            set: Cow<'a, ChunkSet>,
        }

        impl PartialEq for Entry<'_> {
            fn eq(&self, other: &Self) -> bool {
                (self.len, self.seq) == (other.len, other.seq)
            }
        }

        impl Eq for Entry<'_> {}

        impl PartialOrd for Entry<'_> {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for Entry<'_> {
            fn cmp(&self, other: &Self) -> Ordering {
                (self.len, self.seq).cmp(&(other.len, other.seq))
            }
        }

        if sets.is_empty() {
            return ChunkSet::new();
        }

        let mut heap: BinaryHeap<Reverse<Entry>> = sets
            .iter()
            .enumerate()
            .map(|(seq, set)| Reverse(Entry { len: set.len(), seq, set: Cow::Borrowed(*set) }))
            .collect();
        let mut seq = sets.len();

        while heap.len() > 1 {
            let Reverse(first) = heap.pop().expect("the heap holds at least two entries");
            let Reverse(second) = heap.pop().expect("the heap holds at least two entries");
            let merged = first.set.as_ref() | second.set.as_ref();
            heap.push(Reverse(Entry { len: merged.len(), seq, set: Cow::Owned(merged) }));
            seq += 1;
        }

        let Reverse(last) = heap.pop().expect("the heap holds exactly one entry");
        last.set.into_owned()
    }
}
