use core::fmt;

use crate::ChunkSet;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

impl fmt::Debug for ChunkSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.len() < 16 {
            write!(f, "ChunkSet<{:?}>", self.iter().collect::<Vec<u32>>())
        } else {
            write!(
                f,
                "ChunkSet<{:?} values between {:?} and {:?}>",
                self.len(),
                self.min().unwrap(),
                self.max().unwrap()
            )
        }
    }
}
