use core::fmt;
use core::ops::{
    BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, RangeInclusive, Sub, SubAssign,
};

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::store::{self, ArrayStore, RunStore, Store, BITMAP_BYTES};
use crate::util;

pub const ARRAY_LIMIT: u64 = 4096;

/// One directory slot: a bucket key and a handle on the bucket's store.
///
/// The handle is reference counted; cloning a set under copy-on-write clones
/// handles only. Every mutation goes through `store_mut`, which materializes
/// a writable copy when the store is shared.
pub(crate) struct Container {
    pub key: u16,
    store: Arc<Store>,
}

impl Container {
    pub fn new(key: u16) -> Container {
        Container { key, store: Arc::new(Store::new()) }
    }

    pub fn from_store(key: u16, store: Store) -> Container {
        Container { key, store: Arc::new(store) }
    }

    /// A container holding every value of the (non-empty) range, run-encoded
    /// unless a flat representation is no larger.
    pub fn from_range(key: u16, range: RangeInclusive<u16>) -> Container {
        let mut container =
            Container { key, store: Arc::new(Store::Run(RunStore::from_range(range))) };
        container.ensure_correct_store();
        container
    }

    /// A container holding `count` values starting at `start`, `step` apart.
    /// The caller guarantees they all fit in one bucket.
    pub fn from_steps(key: u16, start: u16, count: usize, step: u16) -> Container {
        let vec: Vec<u16> =
            (0..count).map(|i| (u32::from(start) + i as u32 * u32::from(step)) as u16).collect();
        let mut container =
            Container { key, store: Arc::new(Store::Array(ArrayStore::from_vec_unchecked(vec))) };
        container.ensure_correct_store();
        container
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The single un-sharing point: a writable view of the store, deep-cloned
    /// first if any other directory currently holds it.
    pub fn store_mut(&mut self) -> &mut Store {
        Arc::make_mut(&mut self.store)
    }

    /// A handle-only copy; the store is shared and its refcount incremented.
    pub fn share(&self) -> Container {
        Container { key: self.key, store: Arc::clone(&self.store) }
    }

    pub fn clone_for(&self, copy_on_write: bool) -> Container {
        if copy_on_write {
            self.share()
        } else {
            self.clone()
        }
    }

    #[cfg(test)]
    pub fn shared_count(&self) -> usize {
        Arc::strong_count(&self.store)
    }
}

impl Container {
    pub fn len(&self) -> u64 {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[inline]
    pub fn insert(&mut self, index: u16) -> bool {
        if self.store_mut().insert(index) {
            self.ensure_correct_store();
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, index: u16) -> bool {
        if self.store_mut().remove(index) {
            self.ensure_correct_store();
            true
        } else {
            false
        }
    }

    pub fn contains(&self, index: u16) -> bool {
        self.store.contains(index)
    }

    pub fn len_in_range(&self, range: RangeInclusive<u16>) -> u64 {
        self.store.len_in_range(range)
    }

    pub fn min(&self) -> Option<u16> {
        self.store.min()
    }

    #[inline]
    pub fn max(&self) -> Option<u16> {
        self.store.max()
    }

    /// Re-chooses the representation after a mutation: arrays and bitmaps
    /// swap on the cardinality threshold, runs fall back to whichever flat
    /// form is no larger than their serialized size.
    pub(crate) fn ensure_correct_store(&mut self) {
        let new_store = match self.store.as_ref() {
            Store::Bitmap(bits) if bits.len() <= ARRAY_LIMIT => {
                Some(Store::Array(bits.to_array_store()))
            }
            Store::Array(vec) if vec.len() > ARRAY_LIMIT => {
                Some(Store::Bitmap(vec.to_bitmap_store()))
            }
            Store::Run(runs) => {
                let card = runs.len();
                let run_size = runs.byte_size();
                if card <= ARRAY_LIMIT && ArrayStore::serialized_byte_size(card) <= run_size {
                    Some(Store::Array(runs.to_array_store()))
                } else if run_size >= BITMAP_BYTES {
                    Some(Store::Bitmap(runs.to_bitmap_store()))
                } else {
                    None
                }
            }
            _ => None,
        };
        if let Some(new_store) = new_store {
            self.store = Arc::new(new_store);
        }
    }

    /// Run-encodes the container when that is strictly smaller. Returns
    /// whether the container is run-encoded afterwards.
    pub fn optimize(&mut self) -> bool {
        let new_store = match self.store.as_ref() {
            Store::Array(vec) => {
                let size_as_run = RunStore::serialized_byte_size(vec.count_runs());
                if size_as_run < vec.byte_size() {
                    Some(Store::Run(vec.to_run_store()))
                } else {
                    return false;
                }
            }
            Store::Bitmap(bits) => {
                let size_as_run = RunStore::serialized_byte_size(bits.count_runs());
                if size_as_run < BITMAP_BYTES {
                    Some(Store::Run(bits.to_run_store()))
                } else {
                    return false;
                }
            }
            Store::Run(_) => return true,
        };
        if let Some(new_store) = new_store {
            self.store = Arc::new(new_store);
        }
        true
    }

    /// Flattens a run container back to an array or bitmap. Returns whether
    /// a change was applied.
    pub fn remove_run_compression(&mut self) -> bool {
        let new_store = match self.store.as_ref() {
            Store::Array(_) | Store::Bitmap(_) => return false,
            Store::Run(runs) => {
                if runs.len() <= ARRAY_LIMIT {
                    Store::Array(runs.to_array_store())
                } else {
                    Store::Bitmap(runs.to_bitmap_store())
                }
            }
        };
        self.store = Arc::new(new_store);
        true
    }

    /// Union that leaves bitmap-typed results with an unknown cardinality
    /// and an unnormalized representation; see `repair`.
    pub fn lazy_bitor(&self, rhs: &Container) -> Container {
        Container { key: self.key, store: Arc::new(self.store.lazy_bitor(rhs.store())) }
    }

    pub fn lazy_bitor_assign(&mut self, rhs: &Container) {
        self.store_mut().lazy_bitor_assign(rhs.store());
    }

    /// Symmetric difference counterpart of `lazy_bitor`. The result may be
    /// empty; the repair pass is responsible for pruning it.
    pub fn lazy_bitxor(&self, rhs: &Container) -> Container {
        Container { key: self.key, store: Arc::new(self.store.lazy_bitxor(rhs.store())) }
    }

    pub fn lazy_bitxor_assign(&mut self, rhs: &Container) {
        self.store_mut().lazy_bitxor_assign(rhs.store());
    }

    /// Recounts a deferred cardinality and re-chooses the representation.
    /// After this, the container is indistinguishable from an eagerly
    /// computed one.
    pub fn repair(&mut self) {
        let dirty = matches!(self.store.as_ref(), Store::Bitmap(bits) if bits.is_dirty());
        if dirty {
            if let Store::Bitmap(bits) = self.store_mut() {
                bits.repair();
            }
            self.ensure_correct_store();
        }
    }

    /// The complement of the container restricted to `range`; values outside
    /// the range are untouched.
    pub fn flipped_range(&self, range: RangeInclusive<u16>) -> Container {
        let mask = Store::Run(RunStore::from_range(range));
        let mut container =
            Container { key: self.key, store: Arc::new(self.store.as_ref() ^ &mask) };
        container.ensure_correct_store();
        container
    }

    pub fn flip_range_inplace(&mut self, range: RangeInclusive<u16>) {
        let mask = Store::Run(RunStore::from_range(range));
        BitXorAssign::bitxor_assign(self.store_mut(), &mask);
        self.ensure_correct_store();
    }
}

// A deep copy: the new container owns a fresh store. Handle-only copies go
// through `share`.
impl Clone for Container {
    fn clone(&self) -> Self {
        Container { key: self.key, store: Arc::new(self.store.as_ref().clone()) }
    }
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.store == other.store
    }
}

impl BitOr<&Container> for &Container {
    type Output = Container;

    fn bitor(self, rhs: &Container) -> Container {
        let store = BitOr::bitor(self.store(), rhs.store());
        let mut container = Container::from_store(self.key, store);
        container.ensure_correct_store();
        container
    }
}

impl BitOrAssign<&Container> for Container {
    fn bitor_assign(&mut self, rhs: &Container) {
        BitOrAssign::bitor_assign(self.store_mut(), rhs.store());
        self.ensure_correct_store();
    }
}

impl BitAnd<&Container> for &Container {
    type Output = Container;

    fn bitand(self, rhs: &Container) -> Container {
        let store = BitAnd::bitand(self.store(), rhs.store());
        let mut container = Container::from_store(self.key, store);
        container.ensure_correct_store();
        container
    }
}

impl BitAndAssign<&Container> for Container {
    fn bitand_assign(&mut self, rhs: &Container) {
        BitAndAssign::bitand_assign(self.store_mut(), rhs.store());
        self.ensure_correct_store();
    }
}

impl Sub<&Container> for &Container {
    type Output = Container;

    fn sub(self, rhs: &Container) -> Container {
        let store = Sub::sub(self.store(), rhs.store());
        let mut container = Container::from_store(self.key, store);
        container.ensure_correct_store();
        container
    }
}

impl SubAssign<&Container> for Container {
    fn sub_assign(&mut self, rhs: &Container) {
        SubAssign::sub_assign(self.store_mut(), rhs.store());
        self.ensure_correct_store();
    }
}

impl BitXor<&Container> for &Container {
    type Output = Container;

    fn bitxor(self, rhs: &Container) -> Container {
        let store = BitXor::bitxor(self.store(), rhs.store());
        let mut container = Container::from_store(self.key, store);
        container.ensure_correct_store();
        container
    }
}

impl BitXorAssign<&Container> for Container {
    fn bitxor_assign(&mut self, rhs: &Container) {
        BitXorAssign::bitxor_assign(self.store_mut(), rhs.store());
        self.ensure_correct_store();
    }
}

#[derive(Clone)]
pub(crate) struct Iter<'a> {
    pub key: u16,
    inner: store::Iter<'a>,
}

impl<'a> IntoIterator for &'a Container {
    type Item = u32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        let store: &Store = &self.store;
        Iter { key: self.key, inner: store.into_iter() }
    }
}

impl IntoIterator for Container {
    type Item = u32;
    type IntoIter = Iter<'static>;

    fn into_iter(self) -> Iter<'static> {
        let store =
            Arc::try_unwrap(self.store).unwrap_or_else(|shared| shared.as_ref().clone());
        Iter { key: self.key, inner: store.into_iter() }
    }
}

impl Iterator for Iter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        self.inner.next().map(|index| util::join(self.key, index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }

    fn count(self) -> usize
    where
        Self: Sized,
    {
        self.inner.count()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "Container<{:?} @ {:?}>", self.len(), self.key)
    }
}
