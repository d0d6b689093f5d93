#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod container;
mod fmt;
mod flip;
mod inherent;
mod iter;
mod lazy;
mod ops;
#[cfg(feature = "std")]
pub(crate) mod serialization;
mod store;
mod util;

#[cfg(test)]
mod arbitrary;
#[cfg(test)]
mod proptests;

pub use self::iter::{IntoIter, Iter};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// A compressed bitmap of `u32` values.
///
/// The high 16 bits of each value select a bucket in a sorted directory; the
/// low 16 bits live in that bucket's container, stored as a sorted array, a
/// dense bit array or a sequence of runs, whichever is smallest. Cloning a
/// set with [copy-on-write](ChunkSet::set_copy_on_write) enabled shares the
/// containers and defers the copy until one side mutates.
///
/// # Examples
///
/// ```rust
/// use chunkset::ChunkSet;
///
/// let mut set = ChunkSet::new();
///
/// // insert all primes less than 10
/// set.insert(2);
/// set.insert(3);
/// set.insert(5);
/// set.insert(7);
/// println!("total bits set to true: {}", set.len());
/// ```
pub struct ChunkSet {
    containers: Vec<container::Container>,
    copy_on_write: bool,
}
