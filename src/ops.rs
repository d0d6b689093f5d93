use core::borrow::Borrow;
use core::cmp::Ordering;
use core::iter::Peekable;
use core::mem;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

use crate::container::Container;
use crate::ChunkSet;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// An iterator over two sorted container sequences, yielding the container
/// with the smaller key, or both sides when the keys match.
pub(crate) struct Pairs<I, J, L, R>
where
    I: Iterator<Item = L>,
    J: Iterator<Item = R>,
    L: Borrow<Container>,
    R: Borrow<Container>,
{
    left: Peekable<I>,
    right: Peekable<J>,
}

impl<I, J, L, R> Pairs<I, J, L, R>
where
    I: Iterator<Item = L>,
    J: Iterator<Item = R>,
    L: Borrow<Container>,
    R: Borrow<Container>,
{
    pub fn new(
        left: impl IntoIterator<IntoIter = I>,
        right: impl IntoIterator<IntoIter = J>,
    ) -> Pairs<I, J, L, R> {
        Pairs { left: left.into_iter().peekable(), right: right.into_iter().peekable() }
    }
}

impl<I, J, L, R> Iterator for Pairs<I, J, L, R>
where
    I: Iterator<Item = L>,
    J: Iterator<Item = R>,
    L: Borrow<Container>,
    R: Borrow<Container>,
{
    type Item = (Option<L>, Option<R>);

    fn next(&mut self) -> Option<Self::Item> {
        enum Side {
            Left,
            Right,
            Both,
        }
        let side = match (self.left.peek(), self.right.peek()) {
            (Some(left), Some(right)) => match left.borrow().key.cmp(&right.borrow().key) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => Side::Both,
            },
            (Some(_), None) => Side::Left,
            (None, Some(_)) => Side::Right,
            (None, None) => return None,
        };
        Some(match side {
            Side::Left => (self.left.next(), None),
            Side::Right => (None, self.right.next()),
            Side::Both => (self.left.next(), self.right.next()),
        })
    }
}

impl BitOr<ChunkSet> for ChunkSet {
    type Output = ChunkSet;

    /// An `union` between two sets.
    fn bitor(mut self, rhs: ChunkSet) -> ChunkSet {
        BitOrAssign::bitor_assign(&mut self, &rhs);
        self
    }
}

impl BitOr<&ChunkSet> for ChunkSet {
    type Output = ChunkSet;

    /// An `union` between two sets.
    fn bitor(mut self, rhs: &ChunkSet) -> ChunkSet {
        BitOrAssign::bitor_assign(&mut self, rhs);
        self
    }
}

impl BitOr<ChunkSet> for &ChunkSet {
    type Output = ChunkSet;

    /// An `union` between two sets.
    fn bitor(self, rhs: ChunkSet) -> ChunkSet {
        BitOr::bitor(rhs, self)
    }
}

impl BitOr<&ChunkSet> for &ChunkSet {
    type Output = ChunkSet;

    /// An `union` between two sets.
    fn bitor(self, rhs: &ChunkSet) -> ChunkSet {
        let mut containers =
            Vec::with_capacity(self.containers.len() + rhs.containers.len());

        for pair in Pairs::new(&self.containers, &rhs.containers) {
            match pair {
                (Some(lhs), None) => containers.push(lhs.clone_for(self.copy_on_write)),
                (None, Some(other)) => containers.push(other.clone_for(rhs.copy_on_write)),
                (Some(lhs), Some(other)) => containers.push(BitOr::bitor(lhs, other)),
                (None, None) => break,
            }
        }

        ChunkSet { containers, copy_on_write: self.copy_on_write && rhs.copy_on_write }
    }
}

impl BitOrAssign<ChunkSet> for ChunkSet {
    /// An `union` between two sets.
    fn bitor_assign(&mut self, rhs: ChunkSet) {
        BitOrAssign::bitor_assign(self, &rhs)
    }
}

impl BitOrAssign<&ChunkSet> for ChunkSet {
    /// An `union` between two sets.
    fn bitor_assign(&mut self, rhs: &ChunkSet) {
        for container in &rhs.containers {
            let key = container.key;
            match self.containers.binary_search_by_key(&key, |c| c.key) {
                Err(loc) => {
                    self.containers.insert(loc, container.clone_for(rhs.copy_on_write))
                }
                Ok(loc) => BitOrAssign::bitor_assign(&mut self.containers[loc], container),
            }
        }
    }
}

impl BitAnd<ChunkSet> for ChunkSet {
    type Output = ChunkSet;

    /// An `intersection` between two sets.
    fn bitand(mut self, rhs: ChunkSet) -> ChunkSet {
        BitAndAssign::bitand_assign(&mut self, &rhs);
        self
    }
}

impl BitAnd<&ChunkSet> for ChunkSet {
    type Output = ChunkSet;

    /// An `intersection` between two sets.
    fn bitand(mut self, rhs: &ChunkSet) -> ChunkSet {
        BitAndAssign::bitand_assign(&mut self, rhs);
        self
    }
}

impl BitAnd<ChunkSet> for &ChunkSet {
    type Output = ChunkSet;

    /// An `intersection` between two sets.
    fn bitand(self, rhs: ChunkSet) -> ChunkSet {
        BitAnd::bitand(rhs, self)
    }
}

impl BitAnd<&ChunkSet> for &ChunkSet {
    type Output = ChunkSet;

    /// An `intersection` between two sets.
    fn bitand(self, rhs: &ChunkSet) -> ChunkSet {
        let mut containers =
            Vec::with_capacity(self.containers.len().min(rhs.containers.len()));

        // Walk both directories, skipping over the smaller-key side in one
        // jump instead of stepping container by container.
        let (lhs_containers, rhs_containers) = (&self.containers, &rhs.containers);
        let (mut pos1, mut pos2) = (0, 0);
        while pos1 < lhs_containers.len() && pos2 < rhs_containers.len() {
            let key1 = lhs_containers[pos1].key;
            let key2 = rhs_containers[pos2].key;
            match key1.cmp(&key2) {
                Ordering::Equal => {
                    let container = BitAnd::bitand(&lhs_containers[pos1], &rhs_containers[pos2]);
                    if !container.is_empty() {
                        containers.push(container);
                    }
                    pos1 += 1;
                    pos2 += 1;
                }
                Ordering::Less => {
                    pos1 += lhs_containers[pos1..].partition_point(|c| c.key < key2);
                }
                Ordering::Greater => {
                    pos2 += rhs_containers[pos2..].partition_point(|c| c.key < key1);
                }
            }
        }

        ChunkSet { containers, copy_on_write: self.copy_on_write && rhs.copy_on_write }
    }
}

impl BitAndAssign<ChunkSet> for ChunkSet {
    /// An `intersection` between two sets.
    fn bitand_assign(&mut self, rhs: ChunkSet) {
        BitAndAssign::bitand_assign(self, &rhs)
    }
}

impl BitAndAssign<&ChunkSet> for ChunkSet {
    /// An `intersection` between two sets.
    fn bitand_assign(&mut self, rhs: &ChunkSet) {
        // Surviving entries compact toward the front; skipped and emptied
        // containers are dropped on the way.
        self.containers.retain_mut(|cont| {
            match rhs.containers.binary_search_by_key(&cont.key, |c| c.key) {
                Ok(loc) => {
                    BitAndAssign::bitand_assign(cont, &rhs.containers[loc]);
                    !cont.is_empty()
                }
                Err(_) => false,
            }
        })
    }
}

impl Sub<ChunkSet> for ChunkSet {
    type Output = ChunkSet;

    /// A `difference` between two sets.
    fn sub(mut self, rhs: ChunkSet) -> ChunkSet {
        SubAssign::sub_assign(&mut self, &rhs);
        self
    }
}

impl Sub<&ChunkSet> for ChunkSet {
    type Output = ChunkSet;

    /// A `difference` between two sets.
    fn sub(mut self, rhs: &ChunkSet) -> ChunkSet {
        SubAssign::sub_assign(&mut self, rhs);
        self
    }
}

impl Sub<ChunkSet> for &ChunkSet {
    type Output = ChunkSet;

    /// A `difference` between two sets.
    fn sub(self, rhs: ChunkSet) -> ChunkSet {
        Sub::sub(self, &rhs)
    }
}

impl Sub<&ChunkSet> for &ChunkSet {
    type Output = ChunkSet;

    /// A `difference` between two sets.
    fn sub(self, rhs: &ChunkSet) -> ChunkSet {
        let mut containers = Vec::new();

        for pair in Pairs::new(&self.containers, &rhs.containers) {
            match pair {
                (Some(lhs), None) => containers.push(lhs.clone_for(self.copy_on_write)),
                (None, Some(_)) => (),
                (Some(lhs), Some(other)) => {
                    let container = Sub::sub(lhs, other);
                    if !container.is_empty() {
                        containers.push(container);
                    }
                }
                (None, None) => break,
            }
        }

        ChunkSet { containers, copy_on_write: self.copy_on_write && rhs.copy_on_write }
    }
}

impl SubAssign<ChunkSet> for ChunkSet {
    /// A `difference` between two sets.
    fn sub_assign(&mut self, rhs: ChunkSet) {
        SubAssign::sub_assign(self, &rhs)
    }
}

impl SubAssign<&ChunkSet> for ChunkSet {
    /// A `difference` between two sets.
    fn sub_assign(&mut self, rhs: &ChunkSet) {
        self.containers.retain_mut(|cont| {
            match rhs.containers.binary_search_by_key(&cont.key, |c| c.key) {
                Ok(loc) => {
                    SubAssign::sub_assign(cont, &rhs.containers[loc]);
                    !cont.is_empty()
                }
                Err(_) => true,
            }
        })
    }
}

impl BitXor<ChunkSet> for ChunkSet {
    type Output = ChunkSet;

    /// A `symmetric difference` between two sets.
    fn bitxor(mut self, rhs: ChunkSet) -> ChunkSet {
        BitXorAssign::bitxor_assign(&mut self, &rhs);
        self
    }
}

impl BitXor<&ChunkSet> for ChunkSet {
    type Output = ChunkSet;

    /// A `symmetric difference` between two sets.
    fn bitxor(mut self, rhs: &ChunkSet) -> ChunkSet {
        BitXorAssign::bitxor_assign(&mut self, rhs);
        self
    }
}

impl BitXor<ChunkSet> for &ChunkSet {
    type Output = ChunkSet;

    /// A `symmetric difference` between two sets.
    fn bitxor(self, rhs: ChunkSet) -> ChunkSet {
        BitXor::bitxor(rhs, self)
    }
}

impl BitXor<&ChunkSet> for &ChunkSet {
    type Output = ChunkSet;

    /// A `symmetric difference` between two sets.
    fn bitxor(self, rhs: &ChunkSet) -> ChunkSet {
        let mut containers = Vec::new();

        for pair in Pairs::new(&self.containers, &rhs.containers) {
            match pair {
                (Some(lhs), None) => containers.push(lhs.clone_for(self.copy_on_write)),
                (None, Some(other)) => containers.push(other.clone_for(rhs.copy_on_write)),
                (Some(lhs), Some(other)) => {
                    let container = BitXor::bitxor(lhs, other);
                    if !container.is_empty() {
                        containers.push(container);
                    }
                }
                (None, None) => break,
            }
        }

        ChunkSet { containers, copy_on_write: self.copy_on_write && rhs.copy_on_write }
    }
}

impl BitXorAssign<ChunkSet> for ChunkSet {
    /// A `symmetric difference` between two sets.
    fn bitxor_assign(&mut self, rhs: ChunkSet) {
        BitXorAssign::bitxor_assign(self, &rhs)
    }
}

impl BitXorAssign<&ChunkSet> for ChunkSet {
    /// A `symmetric difference` between two sets.
    fn bitxor_assign(&mut self, rhs: &ChunkSet) {
        for pair in Pairs::new(mem::take(&mut self.containers), &rhs.containers) {
            match pair {
                (Some(mut lhs), Some(other)) => {
                    BitXorAssign::bitxor_assign(&mut lhs, other);
                    if !lhs.is_empty() {
                        self.containers.push(lhs);
                    }
                }
                (Some(lhs), None) => self.containers.push(lhs),
                (None, Some(other)) => {
                    self.containers.push(other.clone_for(rhs.copy_on_write))
                }
                (None, None) => break,
            }
        }
    }
}
