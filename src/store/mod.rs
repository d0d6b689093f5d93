mod array_store;
mod bitmap_store;
mod run_store;

use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};
use core::slice;

use alloc::vec;

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;

pub(crate) use self::array_store::ArrayStore;
pub(crate) use self::bitmap_store::{BitmapIter, BitmapStore, BITMAP_BYTES, BITMAP_LENGTH};
pub(crate) use self::run_store::{RunIter, RunStore, Span};

use self::Store::{Array, Bitmap, Run};

#[derive(Clone)]
pub(crate) enum Store {
    Array(ArrayStore),
    Bitmap(BitmapStore),
    Run(RunStore),
}

impl Store {
    pub fn new() -> Store {
        Array(ArrayStore::new())
    }

    #[inline]
    pub fn insert(&mut self, index: u16) -> bool {
        match self {
            Array(vec) => vec.insert(index),
            Bitmap(bits) => bits.insert(index),
            Run(runs) => runs.insert(index),
        }
    }

    pub fn remove(&mut self, index: u16) -> bool {
        match self {
            Array(vec) => vec.remove(index),
            Bitmap(bits) => bits.remove(index),
            Run(runs) => runs.remove(index),
        }
    }

    pub fn contains(&self, index: u16) -> bool {
        match self {
            Array(vec) => vec.contains(index),
            Bitmap(bits) => bits.contains(index),
            Run(runs) => runs.contains(index),
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            Array(vec) => vec.len(),
            Bitmap(bits) => bits.len(),
            Run(runs) => runs.len(),
        }
    }

    pub fn len_in_range(&self, range: core::ops::RangeInclusive<u16>) -> u64 {
        match self {
            Array(vec) => vec.len_in_range(range),
            Bitmap(bits) => bits.len_in_range(range),
            Run(runs) => runs.len_in_range(range),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Array(vec) => vec.is_empty(),
            Bitmap(bits) => bits.is_empty(),
            Run(runs) => runs.is_empty(),
        }
    }

    pub fn min(&self) -> Option<u16> {
        match self {
            Array(vec) => vec.min(),
            Bitmap(bits) => bits.min(),
            Run(runs) => runs.min(),
        }
    }

    #[inline]
    pub fn max(&self) -> Option<u16> {
        match self {
            Array(vec) => vec.max(),
            Bitmap(bits) => bits.max(),
            Run(runs) => runs.max(),
        }
    }

    /// Union that defers cardinality maintenance on dense results.
    ///
    /// Bitmap-typed outputs are left dirty and no representation choice is
    /// made; `Container::repair` finalizes both.
    pub fn lazy_bitor(&self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(lhs), Array(rhs)) => {
                if lhs.len() + rhs.len() <= crate::container::ARRAY_LIMIT {
                    Array(BitOr::bitor(lhs, rhs))
                } else {
                    let mut bits = lhs.to_bitmap_store();
                    bits.or_assign_lazy_array(rhs);
                    Bitmap(bits)
                }
            }
            (Bitmap(lhs), Bitmap(rhs)) => {
                let mut bits = lhs.clone();
                bits.or_assign_lazy(rhs);
                Bitmap(bits)
            }
            (Bitmap(bits), Array(vec)) | (Array(vec), Bitmap(bits)) => {
                let mut bits = bits.clone();
                bits.or_assign_lazy_array(vec);
                Bitmap(bits)
            }
            (Bitmap(bits), Run(runs)) | (Run(runs), Bitmap(bits)) => {
                let mut bits = bits.clone();
                bits.or_assign_lazy_spans(runs.spans());
                Bitmap(bits)
            }
            (Run(lhs), Run(rhs)) => Run(lhs.union(rhs)),
            (Run(runs), Array(vec)) | (Array(vec), Run(runs)) => {
                let mut runs = runs.clone();
                for &index in vec.iter() {
                    runs.insert(index);
                }
                Run(runs)
            }
        }
    }

    pub fn lazy_bitor_assign(&mut self, rhs: &Store) {
        match (self, rhs) {
            (Bitmap(lhs), Bitmap(rhs)) => lhs.or_assign_lazy(rhs),
            (Bitmap(lhs), Array(rhs)) => lhs.or_assign_lazy_array(rhs),
            (Bitmap(lhs), Run(rhs)) => lhs.or_assign_lazy_spans(rhs.spans()),
            (this, rhs) => *this = this.lazy_bitor(rhs),
        }
    }

    /// Symmetric difference that defers cardinality maintenance on dense
    /// results. Unlike the union, the result may be empty.
    pub fn lazy_bitxor(&self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(lhs), Array(rhs)) => {
                if lhs.len() + rhs.len() <= crate::container::ARRAY_LIMIT {
                    Array(BitXor::bitxor(lhs, rhs))
                } else {
                    let mut bits = lhs.to_bitmap_store();
                    bits.xor_assign_lazy_array(rhs);
                    Bitmap(bits)
                }
            }
            (Bitmap(lhs), Bitmap(rhs)) => {
                let mut bits = lhs.clone();
                bits.xor_assign_lazy(rhs);
                Bitmap(bits)
            }
            (Bitmap(bits), Array(vec)) | (Array(vec), Bitmap(bits)) => {
                let mut bits = bits.clone();
                bits.xor_assign_lazy_array(vec);
                Bitmap(bits)
            }
            (Bitmap(bits), Run(runs)) | (Run(runs), Bitmap(bits)) => {
                let mut bits = bits.clone();
                bits.xor_assign_lazy_spans(runs.spans());
                Bitmap(bits)
            }
            (Run(lhs), Run(rhs)) => Run(lhs.xor(rhs)),
            (Run(runs), Array(vec)) | (Array(vec), Run(runs)) => {
                let mut runs = runs.clone();
                for &index in vec.iter() {
                    if !runs.remove(index) {
                        runs.insert(index);
                    }
                }
                Run(runs)
            }
        }
    }

    pub fn lazy_bitxor_assign(&mut self, rhs: &Store) {
        match (self, rhs) {
            (Bitmap(lhs), Bitmap(rhs)) => lhs.xor_assign_lazy(rhs),
            (Bitmap(lhs), Array(rhs)) => lhs.xor_assign_lazy_array(rhs),
            (Bitmap(lhs), Run(rhs)) => lhs.xor_assign_lazy_spans(rhs.spans()),
            (this, rhs) => *this = this.lazy_bitxor(rhs),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

impl BitOr<&Store> for &Store {
    type Output = Store;

    fn bitor(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(lhs), Array(rhs)) => Array(BitOr::bitor(lhs, rhs)),
            (Bitmap(lhs), Bitmap(rhs)) => {
                let mut bits = lhs.clone();
                BitOrAssign::bitor_assign(&mut bits, rhs);
                Bitmap(bits)
            }
            (Bitmap(bits), Array(vec)) | (Array(vec), Bitmap(bits)) => {
                let mut bits = bits.clone();
                BitOrAssign::bitor_assign(&mut bits, vec);
                Bitmap(bits)
            }
            (Bitmap(bits), Run(runs)) | (Run(runs), Bitmap(bits)) => {
                let mut bits = bits.clone();
                for span in runs.spans() {
                    bits.insert_range(span.start..=span.end);
                }
                Bitmap(bits)
            }
            (Run(lhs), Run(rhs)) => Run(lhs.union(rhs)),
            (Run(runs), Array(vec)) | (Array(vec), Run(runs)) => {
                let mut runs = runs.clone();
                for &index in vec.iter() {
                    runs.insert(index);
                }
                Run(runs)
            }
        }
    }
}

impl BitOrAssign<&Store> for Store {
    fn bitor_assign(&mut self, rhs: &Store) {
        match (self, rhs) {
            (Bitmap(lhs), Bitmap(rhs)) => BitOrAssign::bitor_assign(lhs, rhs),
            (Bitmap(lhs), Array(rhs)) => BitOrAssign::bitor_assign(lhs, rhs),
            (Bitmap(lhs), Run(rhs)) => {
                for span in rhs.spans() {
                    lhs.insert_range(span.start..=span.end);
                }
            }
            (Run(lhs), Array(rhs)) => {
                for &index in rhs.iter() {
                    lhs.insert(index);
                }
            }
            (Run(lhs), Run(rhs)) => *lhs = lhs.union(rhs),
            (this, rhs) => *this = BitOr::bitor(&*this, rhs),
        }
    }
}

impl BitAnd<&Store> for &Store {
    type Output = Store;

    fn bitand(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(lhs), Array(rhs)) => Array(BitAnd::bitand(lhs, rhs)),
            (Bitmap(lhs), Bitmap(rhs)) => {
                let mut bits = lhs.clone();
                BitAndAssign::bitand_assign(&mut bits, rhs);
                Bitmap(bits)
            }
            (Bitmap(bits), Array(vec)) | (Array(vec), Bitmap(bits)) => {
                let mut vec = vec.clone();
                vec.retain(|index| bits.contains(index));
                Array(vec)
            }
            (Bitmap(bits), Run(runs)) | (Run(runs), Bitmap(bits)) => {
                let mut bits = bits.clone();
                for gap in runs.complement().spans() {
                    bits.remove_range(gap.start..=gap.end);
                }
                Bitmap(bits)
            }
            (Run(lhs), Run(rhs)) => Run(lhs.intersection(rhs)),
            (Run(runs), Array(vec)) | (Array(vec), Run(runs)) => {
                let mut vec = vec.clone();
                vec.retain(|index| runs.contains(index));
                Array(vec)
            }
        }
    }
}

impl BitAndAssign<&Store> for Store {
    fn bitand_assign(&mut self, rhs: &Store) {
        match (self, rhs) {
            (Bitmap(lhs), Bitmap(rhs)) => BitAndAssign::bitand_assign(lhs, rhs),
            (Array(lhs), Bitmap(rhs)) => lhs.retain(|index| rhs.contains(index)),
            (Array(lhs), Run(rhs)) => lhs.retain(|index| rhs.contains(index)),
            (Array(lhs), Array(rhs)) => *lhs = BitAnd::bitand(&*lhs, rhs),
            (this, rhs) => *this = BitAnd::bitand(&*this, rhs),
        }
    }
}

impl Sub<&Store> for &Store {
    type Output = Store;

    fn sub(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(lhs), Array(rhs)) => Array(Sub::sub(lhs, rhs)),
            (Array(lhs), Bitmap(rhs)) => {
                let mut vec = lhs.clone();
                vec.retain(|index| !rhs.contains(index));
                Array(vec)
            }
            (Array(lhs), Run(rhs)) => {
                let mut vec = lhs.clone();
                vec.retain(|index| !rhs.contains(index));
                Array(vec)
            }
            (Bitmap(lhs), Bitmap(rhs)) => {
                let mut bits = lhs.clone();
                SubAssign::sub_assign(&mut bits, rhs);
                Bitmap(bits)
            }
            (Bitmap(lhs), Array(rhs)) => {
                let mut bits = lhs.clone();
                SubAssign::sub_assign(&mut bits, rhs);
                Bitmap(bits)
            }
            (Bitmap(lhs), Run(rhs)) => {
                let mut bits = lhs.clone();
                for span in rhs.spans() {
                    bits.remove_range(span.start..=span.end);
                }
                Bitmap(bits)
            }
            (Run(lhs), Run(rhs)) => Run(lhs.difference(rhs)),
            (Run(lhs), Array(rhs)) => {
                let mut runs = lhs.clone();
                for &index in rhs.iter() {
                    runs.remove(index);
                }
                Run(runs)
            }
            (Run(lhs), Bitmap(rhs)) => {
                let mut bits = lhs.to_bitmap_store();
                SubAssign::sub_assign(&mut bits, rhs);
                Bitmap(bits)
            }
        }
    }
}

impl SubAssign<&Store> for Store {
    fn sub_assign(&mut self, rhs: &Store) {
        match (self, rhs) {
            (Bitmap(lhs), Bitmap(rhs)) => SubAssign::sub_assign(lhs, rhs),
            (Bitmap(lhs), Array(rhs)) => SubAssign::sub_assign(lhs, rhs),
            (Bitmap(lhs), Run(rhs)) => {
                for span in rhs.spans() {
                    lhs.remove_range(span.start..=span.end);
                }
            }
            (Array(lhs), Bitmap(rhs)) => lhs.retain(|index| !rhs.contains(index)),
            (Array(lhs), Run(rhs)) => lhs.retain(|index| !rhs.contains(index)),
            (Array(lhs), Array(rhs)) => *lhs = Sub::sub(&*lhs, rhs),
            (Run(lhs), Run(rhs)) => *lhs = lhs.difference(rhs),
            (Run(lhs), Array(rhs)) => {
                for &index in rhs.iter() {
                    lhs.remove(index);
                }
            }
            (this, rhs) => *this = Sub::sub(&*this, rhs),
        }
    }
}

impl BitXor<&Store> for &Store {
    type Output = Store;

    fn bitxor(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(lhs), Array(rhs)) => Array(BitXor::bitxor(lhs, rhs)),
            (Bitmap(lhs), Bitmap(rhs)) => {
                let mut bits = lhs.clone();
                BitXorAssign::bitxor_assign(&mut bits, rhs);
                Bitmap(bits)
            }
            (Bitmap(bits), Array(vec)) | (Array(vec), Bitmap(bits)) => {
                let mut bits = bits.clone();
                BitXorAssign::bitxor_assign(&mut bits, vec);
                Bitmap(bits)
            }
            (Bitmap(bits), Run(runs)) | (Run(runs), Bitmap(bits)) => {
                let mut bits = bits.clone();
                for span in runs.spans() {
                    bits.flip_range(span.start..=span.end);
                }
                Bitmap(bits)
            }
            (Run(lhs), Run(rhs)) => Run(lhs.xor(rhs)),
            (Run(runs), Array(vec)) | (Array(vec), Run(runs)) => {
                let mut runs = runs.clone();
                for &index in vec.iter() {
                    if !runs.remove(index) {
                        runs.insert(index);
                    }
                }
                Run(runs)
            }
        }
    }
}

impl BitXorAssign<&Store> for Store {
    fn bitxor_assign(&mut self, rhs: &Store) {
        match (self, rhs) {
            (Bitmap(lhs), Bitmap(rhs)) => BitXorAssign::bitxor_assign(lhs, rhs),
            (Bitmap(lhs), Array(rhs)) => BitXorAssign::bitxor_assign(lhs, rhs),
            (Bitmap(lhs), Run(rhs)) => {
                for span in rhs.spans() {
                    lhs.flip_range(span.start..=span.end);
                }
            }
            (Run(lhs), Run(rhs)) => *lhs = lhs.xor(rhs),
            (Run(lhs), Array(rhs)) => {
                for &index in rhs.iter() {
                    if !lhs.remove(index) {
                        lhs.insert(index);
                    }
                }
            }
            (this, rhs) => *this = BitXor::bitxor(&*this, rhs),
        }
    }
}

impl<'a> IntoIterator for &'a Store {
    type Item = u16;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        match self {
            Array(vec) => Iter::Array(vec.iter()),
            Bitmap(bits) => Iter::BitmapBorrowed(bits.iter()),
            Run(runs) => Iter::Run(runs.iter()),
        }
    }
}

impl IntoIterator for Store {
    type Item = u16;
    type IntoIter = Iter<'static>;

    fn into_iter(self) -> Iter<'static> {
        match self {
            Array(vec) => Iter::Vec(vec.into_iter()),
            Bitmap(bits) => Iter::BitmapOwned(bits.into_iter()),
            Run(runs) => Iter::Run(runs.into_iter()),
        }
    }
}

// Containers compare as value sets: two stores are equal whenever they hold
// the same remainders, whatever their representations.
impl PartialEq for Store {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Array(lhs), Array(rhs)) => lhs == rhs,
            (Bitmap(lhs), Bitmap(rhs)) => lhs == rhs,
            (Run(lhs), Run(rhs)) => lhs == rhs,
            _ => {
                self.len() == other.len()
                    && self.into_iter().zip(other.into_iter()).all(|(lhs, rhs)| lhs == rhs)
            }
        }
    }
}

#[derive(Clone)]
pub(crate) enum Iter<'a> {
    Array(slice::Iter<'a, u16>),
    Vec(vec::IntoIter<u16>),
    BitmapBorrowed(BitmapIter<&'a [u64; BITMAP_LENGTH]>),
    BitmapOwned(BitmapIter<Box<[u64; BITMAP_LENGTH]>>),
    Run(RunIter),
}

impl Iterator for Iter<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        match self {
            Iter::Array(inner) => inner.next().copied(),
            Iter::Vec(inner) => inner.next(),
            Iter::BitmapBorrowed(inner) => inner.next(),
            Iter::BitmapOwned(inner) => inner.next(),
            Iter::Run(inner) => inner.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Iter::Array(inner) => inner.size_hint(),
            Iter::Vec(inner) => inner.size_hint(),
            Iter::BitmapBorrowed(inner) => inner.size_hint(),
            Iter::BitmapOwned(inner) => inner.size_hint(),
            Iter::Run(inner) => inner.size_hint(),
        }
    }

    fn count(self) -> usize
    where
        Self: Sized,
    {
        match self {
            Iter::Array(inner) => inner.count(),
            Iter::Vec(inner) => inner.count(),
            Iter::BitmapBorrowed(inner) => inner.count(),
            Iter::BitmapOwned(inner) => inner.count(),
            Iter::Run(inner) => inner.count(),
        }
    }
}
