use core::cmp::Ordering;
use core::fmt::{Display, Formatter};
use core::ops::RangeInclusive;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use super::array_store::ArrayStore;
use super::bitmap_store::BitmapStore;

/// An inclusive interval of remainders.
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Debug)]
pub(crate) struct Span {
    pub start: u16,
    pub end: u16,
}

impl Span {
    pub fn new(start: u16, end: u16) -> Span {
        debug_assert!(start <= end);
        Span { start, end }
    }

    pub fn run_len(&self) -> u64 {
        u64::from(self.end - self.start) + 1
    }
}

/// A store of sorted, disjoint, non-adjacent spans of remainders.
#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) struct RunStore {
    spans: Vec<Span>,
}

fn search(spans: &[Span], index: u16) -> Result<usize, usize> {
    spans.binary_search_by(|span| {
        if span.end < index {
            Ordering::Less
        } else if span.start > index {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}

impl RunStore {
    pub fn new() -> RunStore {
        RunStore { spans: Vec::new() }
    }

    pub fn from_range(range: RangeInclusive<u16>) -> RunStore {
        let mut spans = Vec::with_capacity(1);
        spans.push(Span::new(*range.start(), *range.end()));
        RunStore { spans }
    }

    ///
    /// Create a new RunStore from a given span vec.
    /// It is up to the caller to ensure the spans are sorted, disjoint and
    /// separated by at least one absent value. Favor `try_from` for cases in
    /// which these invariants should be checked.
    ///
    /// # Panics
    ///
    /// When debug_assertions are enabled and the above invariants are not met
    pub fn from_vec_unchecked(spans: Vec<Span>) -> RunStore {
        if cfg!(debug_assertions) {
            spans.try_into().unwrap()
        } else {
            RunStore { spans }
        }
    }

    pub fn serialized_byte_size(n_runs: u64) -> u64 {
        2 + 4 * n_runs
    }

    pub fn byte_size(&self) -> u64 {
        Self::serialized_byte_size(self.spans.len() as u64)
    }

    pub fn insert(&mut self, index: u16) -> bool {
        match search(&self.spans, index) {
            Ok(_) => false,
            Err(loc) => {
                let extends_prev =
                    loc > 0 && index != 0 && self.spans[loc - 1].end == index - 1;
                let extends_next = loc < self.spans.len()
                    && index != u16::MAX
                    && self.spans[loc].start == index + 1;
                match (extends_prev, extends_next) {
                    (true, true) => {
                        // The value bridges two spans
                        self.spans[loc - 1].end = self.spans[loc].end;
                        self.spans.remove(loc);
                    }
                    (true, false) => self.spans[loc - 1].end = index,
                    (false, true) => self.spans[loc].start = index,
                    (false, false) => self.spans.insert(loc, Span::new(index, index)),
                }
                true
            }
        }
    }

    pub fn remove(&mut self, index: u16) -> bool {
        match search(&self.spans, index) {
            Err(_) => false,
            Ok(loc) => {
                let span = self.spans[loc];
                if span.start == index && span.end == index {
                    self.spans.remove(loc);
                } else if span.start == index {
                    self.spans[loc].start = index + 1;
                } else if span.end == index {
                    self.spans[loc].end = index - 1;
                } else {
                    // The value lies strictly inside the span, split it
                    self.spans[loc].end = index - 1;
                    self.spans.insert(loc + 1, Span::new(index + 1, span.end));
                }
                true
            }
        }
    }

    pub fn contains(&self, index: u16) -> bool {
        search(&self.spans, index).is_ok()
    }

    pub fn len(&self) -> u64 {
        self.spans.iter().map(Span::run_len).sum()
    }

    pub fn len_in_range(&self, range: RangeInclusive<u16>) -> u64 {
        let start = *range.start();
        let end = *range.end();
        self.spans
            .iter()
            .filter(|span| span.start <= end && start <= span.end)
            .map(|span| Span::new(span.start.max(start), span.end.min(end)).run_len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn n_runs(&self) -> usize {
        self.spans.len()
    }

    pub fn min(&self) -> Option<u16> {
        self.spans.first().map(|span| span.start)
    }

    #[inline]
    pub fn max(&self) -> Option<u16> {
        self.spans.last().map(|span| span.end)
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn union(&self, other: &RunStore) -> RunStore {
        let mut merged: Vec<Span> = Vec::with_capacity(self.spans.len() + other.spans.len());

        let (mut iter1, mut iter2) = (self.spans.iter(), other.spans.iter());
        let (mut next1, mut next2) = (iter1.next(), iter2.next());
        loop {
            // Take the span with the smaller start at each step
            let span = match (next1, next2) {
                (None, None) => break,
                (Some(span), None) => {
                    next1 = iter1.next();
                    span
                }
                (None, Some(span)) => {
                    next2 = iter2.next();
                    span
                }
                (Some(span1), Some(span2)) => {
                    if span1.start <= span2.start {
                        next1 = iter1.next();
                        span1
                    } else {
                        next2 = iter2.next();
                        span2
                    }
                }
            };

            match merged.last_mut() {
                // Merge overlapping or adjacent spans
                Some(last) if u32::from(span.start) <= u32::from(last.end) + 1 => {
                    last.end = last.end.max(span.end);
                }
                _ => merged.push(*span),
            }
        }

        RunStore { spans: merged }
    }

    pub fn intersection(&self, other: &RunStore) -> RunStore {
        let mut spans = Vec::new();

        let (mut iter1, mut iter2) = (self.spans.iter(), other.spans.iter());
        let (mut next1, mut next2) = (iter1.next(), iter2.next());
        while let (Some(span1), Some(span2)) = (next1, next2) {
            if span2.start <= span1.end && span1.start <= span2.end {
                spans.push(Span::new(span1.start.max(span2.start), span1.end.min(span2.end)));
            }
            match span1.end.cmp(&span2.end) {
                Ordering::Less => next1 = iter1.next(),
                Ordering::Greater => next2 = iter2.next(),
                Ordering::Equal => {
                    next1 = iter1.next();
                    next2 = iter2.next();
                }
            }
        }

        RunStore { spans }
    }

    pub fn difference(&self, other: &RunStore) -> RunStore {
        let mut spans = Vec::new();
        let mut j = 0;

        for &span in &self.spans {
            let mut start = span.start;
            let end = span.end;
            loop {
                // Skip subtrahend spans that lie entirely before the remainder
                while j < other.spans.len() && other.spans[j].end < start {
                    j += 1;
                }
                if j == other.spans.len() || other.spans[j].start > end {
                    spans.push(Span::new(start, end));
                    break;
                }
                let cut = other.spans[j];
                if cut.start > start {
                    spans.push(Span::new(start, cut.start - 1));
                }
                if cut.end >= end {
                    // The cut may also cover the next span, keep it around
                    break;
                }
                start = cut.end + 1;
                j += 1;
            }
        }

        RunStore { spans }
    }

    pub fn xor(&self, other: &RunStore) -> RunStore {
        self.union(other).difference(&self.intersection(other))
    }

    /// The spans absent from this store, in ascending order.
    pub fn complement(&self) -> RunStore {
        let mut spans = Vec::with_capacity(self.spans.len() + 1);
        let mut next_start = 0u32;
        for span in &self.spans {
            if u32::from(span.start) > next_start {
                spans.push(Span::new(next_start as u16, span.start - 1));
            }
            next_start = u32::from(span.end) + 1;
        }
        if next_start <= u32::from(u16::MAX) {
            spans.push(Span::new(next_start as u16, u16::MAX));
        }
        RunStore { spans }
    }

    pub fn to_array_store(&self) -> ArrayStore {
        let mut vec = Vec::with_capacity(self.len() as usize);
        for span in &self.spans {
            vec.extend(span.start..=span.end);
        }
        ArrayStore::from_vec_unchecked(vec)
    }

    pub fn to_bitmap_store(&self) -> BitmapStore {
        let mut bits = BitmapStore::new();
        for span in &self.spans {
            bits.insert_range(span.start..=span.end);
        }
        bits
    }

    pub fn iter(&self) -> RunIter {
        RunIter::new(self.spans.clone(), self.len())
    }

    pub fn into_iter(self) -> RunIter {
        let len = self.len();
        RunIter::new(self.spans, len)
    }
}

impl Default for RunStore {
    fn default() -> Self {
        RunStore::new()
    }
}

#[derive(Debug)]
pub struct Error {
    index: usize,
    kind: ErrorKind,
}

#[derive(Debug)]
pub enum ErrorKind {
    Inverted,
    OutOfOrder,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::Inverted => {
                write!(f, "Span at index {} ends before it starts", self.index)
            }
            ErrorKind::OutOfOrder => {
                write!(f, "Span at index {} overlaps, touches or precedes its predecessor", self.index)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl TryFrom<Vec<Span>> for RunStore {
    type Error = Error;

    fn try_from(spans: Vec<Span>) -> Result<Self, Self::Error> {
        let mut prev: Option<Span> = None;
        for (i, &span) in spans.iter().enumerate() {
            if span.end < span.start {
                return Err(Error { index: i, kind: ErrorKind::Inverted });
            }
            if let Some(prev) = prev {
                if u32::from(span.start) <= u32::from(prev.end) + 1 {
                    return Err(Error { index: i, kind: ErrorKind::OutOfOrder });
                }
            }
            prev = Some(span);
        }
        Ok(RunStore { spans })
    }
}

#[derive(Clone)]
pub(crate) struct RunIter {
    index: usize,
    offset: u64,
    remaining: u64,
    spans: Vec<Span>,
}

impl RunIter {
    fn new(spans: Vec<Span>, len: u64) -> RunIter {
        RunIter { index: 0, offset: 0, remaining: len, spans }
    }
}

impl Iterator for RunIter {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        if self.index == self.spans.len() {
            return None;
        }
        let value = self.spans[self.index].start + self.offset as u16;
        self.offset += 1;
        if self.offset == self.spans[self.index].run_len() {
            self.offset = 0;
            self.index += 1;
        }
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }

    fn count(self) -> usize
    where
        Self: Sized,
    {
        self.remaining as usize
    }
}

impl ExactSizeIterator for RunIter {}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(spans: &[(u16, u16)]) -> RunStore {
        RunStore::from_vec_unchecked(spans.iter().map(|&(s, e)| Span::new(s, e)).collect())
    }

    #[test]
    fn insert_standalone() {
        let mut runs = store(&[(0, 3), (9, 10)]);
        assert!(runs.insert(5));
        assert!(!runs.insert(5));
        assert_eq!(runs, store(&[(0, 3), (5, 5), (9, 10)]));
    }

    #[test]
    fn insert_extends_neighbors() {
        let mut runs = store(&[(0, 3), (9, 10)]);
        assert!(runs.insert(4));
        assert_eq!(runs, store(&[(0, 4), (9, 10)]));
        assert!(runs.insert(8));
        assert_eq!(runs, store(&[(0, 4), (8, 10)]));
    }

    #[test]
    fn insert_bridges_neighbors() {
        let mut runs = store(&[(0, 3), (5, 10)]);
        assert!(runs.insert(4));
        assert_eq!(runs, store(&[(0, 10)]));
    }

    #[test]
    fn insert_u16_max() {
        let mut runs = store(&[(0, 3)]);
        assert!(runs.insert(u16::MAX));
        assert_eq!(runs, store(&[(0, 3), (u16::MAX, u16::MAX)]));

        let mut runs = store(&[(0, u16::MAX - 1)]);
        assert!(runs.insert(u16::MAX));
        assert_eq!(runs, store(&[(0, u16::MAX)]));
    }

    #[test]
    fn remove_splits_span() {
        let mut runs = store(&[(1, 3)]);
        assert!(runs.remove(2));
        assert!(!runs.remove(2));
        assert_eq!(runs, store(&[(1, 1), (3, 3)]));
    }

    #[test]
    fn remove_at_bounds() {
        let mut runs = store(&[(50, 60)]);
        assert!(runs.remove(50));
        assert!(runs.remove(60));
        assert_eq!(runs, store(&[(51, 59)]));
        let mut runs = store(&[(7, 7)]);
        assert!(runs.remove(7));
        assert!(runs.is_empty());
    }

    #[test]
    fn union_merges_adjacent() {
        let lhs = store(&[(0, 3), (10, 20)]);
        let rhs = store(&[(4, 6), (22, 30)]);
        assert_eq!(lhs.union(&rhs), store(&[(0, 6), (10, 20), (22, 30)]));
    }

    #[test]
    fn union_overlapping() {
        let lhs = store(&[(0, 10), (40, 60)]);
        let rhs = store(&[(5, 45)]);
        assert_eq!(lhs.union(&rhs), store(&[(0, 60)]));
    }

    #[test]
    fn intersection_clips() {
        let lhs = store(&[(0, 10), (40, 60)]);
        let rhs = store(&[(5, 45)]);
        assert_eq!(lhs.intersection(&rhs), store(&[(5, 10), (40, 45)]));
        assert!(lhs.intersection(&store(&[(20, 30)])).is_empty());
    }

    #[test]
    fn difference_cuts() {
        let lhs = store(&[(0, 10), (40, 60)]);
        let rhs = store(&[(5, 45)]);
        assert_eq!(lhs.difference(&rhs), store(&[(0, 4), (46, 60)]));
    }

    #[test]
    fn difference_single_cut_covers_many() {
        let lhs = store(&[(0, 10), (20, 30), (40, 60)]);
        let rhs = store(&[(5, 50)]);
        assert_eq!(lhs.difference(&rhs), store(&[(0, 4), (51, 60)]));
    }

    #[test]
    fn xor_is_symmetric_difference() {
        let lhs = store(&[(0, 10)]);
        let rhs = store(&[(5, 15)]);
        assert_eq!(lhs.xor(&rhs), store(&[(0, 4), (11, 15)]));
        assert_eq!(lhs.xor(&lhs), RunStore::new());
    }

    #[test]
    fn complement_walks_gaps() {
        assert_eq!(RunStore::new().complement(), store(&[(0, u16::MAX)]));
        assert_eq!(RunStore::from_range(0..=u16::MAX).complement(), RunStore::new());
        assert_eq!(
            store(&[(1, 10), (20, u16::MAX)]).complement(),
            store(&[(0, 0), (11, 19)])
        );
    }

    #[test]
    fn conversions_preserve_values() {
        let runs = store(&[(1, 3), (7, 7), (100, 4000)]);
        assert_eq!(runs.to_array_store().len(), runs.len());
        assert_eq!(runs.to_bitmap_store().len(), runs.len());
        assert_eq!(runs.to_bitmap_store().to_run_store(), runs);
    }

    #[test]
    fn iter_expands_spans() {
        let runs = store(&[(1, 3), (7, 7)]);
        assert_eq!(runs.iter().collect::<Vec<_>>(), vec![1, 2, 3, 7]);
        assert_eq!(runs.iter().size_hint(), (4, Some(4)));
    }

    #[test]
    fn try_from_rejects_touching_spans() {
        assert!(RunStore::try_from(vec![Span { start: 3, end: 1 }]).is_err());
        assert!(RunStore::try_from(vec![Span { start: 0, end: 1 }, Span { start: 2, end: 4 }])
            .is_err());
        assert!(RunStore::try_from(vec![Span { start: 0, end: 1 }, Span { start: 3, end: 4 }])
            .is_ok());
    }
}
