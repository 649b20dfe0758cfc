//! Sets of column ordinals.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

const WORD_BITS: usize = 64;

/// A set of zero-based column ordinals within an operator's output row.
///
/// Backed by a bit set; rows narrower than 128 columns never allocate.
/// Trailing zero words are never stored, so derived equality and hashing
/// compare sets by content.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<usize>", into = "Vec<usize>")]
pub struct ColumnSet {
    words: SmallVec<[u64; 2]>,
}

impl ColumnSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding a single column.
    #[must_use]
    pub fn of(column: usize) -> Self {
        let mut set = Self::new();
        set.insert(column);
        set
    }

    /// Creates the set `[start, end)`.
    #[must_use]
    pub fn range(start: usize, end: usize) -> Self {
        (start..end).collect()
    }

    /// Adds a column to the set.
    pub fn insert(&mut self, column: usize) {
        let word = column / WORD_BITS;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << (column % WORD_BITS);
    }

    /// Returns true if the column is in the set.
    #[must_use]
    pub fn contains(&self, column: usize) -> bool {
        self.words
            .get(column / WORD_BITS)
            .is_some_and(|w| w & (1u64 << (column % WORD_BITS)) != 0)
    }

    /// Number of columns in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Smallest column in the set.
    #[must_use]
    pub fn first(&self) -> Option<usize> {
        self.iter().next()
    }

    /// Largest column in the set.
    #[must_use]
    pub fn last(&self) -> Option<usize> {
        let top = self.words.len().checked_sub(1)?;
        let word = self.words[top];
        Some(top * WORD_BITS + (WORD_BITS - 1 - word.leading_zeros() as usize))
    }

    /// Returns true if every column of `self` is also in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &ColumnSet) -> bool {
        self.words.iter().enumerate().all(|(i, w)| {
            let o = other.words.get(i).copied().unwrap_or(0);
            w & !o == 0
        })
    }

    /// Returns the union of two sets.
    #[must_use]
    pub fn union(&self, other: &ColumnSet) -> ColumnSet {
        let len = self.words.len().max(other.words.len());
        let words = (0..len)
            .map(|i| {
                self.words.get(i).copied().unwrap_or(0) | other.words.get(i).copied().unwrap_or(0)
            })
            .collect();
        ColumnSet { words }
    }

    /// Iterates over the columns in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let tz = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(i * WORD_BITS + tz)
            })
        })
    }
}

impl FromIterator<usize> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = ColumnSet::new();
        for column in iter {
            set.insert(column);
        }
        set
    }
}

impl From<Vec<usize>> for ColumnSet {
    fn from(columns: Vec<usize>) -> Self {
        columns.into_iter().collect()
    }
}

impl From<ColumnSet> for Vec<usize> {
    fn from(set: ColumnSet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Debug for ColumnSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for ColumnSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, column) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", column)?;
        }
        write!(f, "}}")
    }
}
