//! Dense set of row indices over a fixed universe.
//!
//! Every query node consumes and produces a `Bitset`. All sets flowing through
//! one evaluation share the same declared universe size, which is why `union`
//! and `intersection` take the larger of the two lengths: complement needs to
//! know the true size of the universe.

use std::fmt;

const WORD_BITS: usize = 64;

/// A subset of `0..len`, packed 64 indices per word.
///
/// Bits at indices `>= len` are never set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitset {
    words: Vec<u64>,
    len: usize,
}

impl Bitset {
    /// Create a set over `size` indices, either empty or full.
    pub fn new(size: usize, all_set: bool) -> Self {
        let mut set = Self {
            words: vec![0; size.div_ceil(WORD_BITS)],
            len: size,
        };
        if all_set {
            set.fill();
        }
        set
    }

    /// Set every index in the universe.
    pub fn fill(&mut self) {
        let full = self.len / WORD_BITS;
        self.words[..full].fill(u64::MAX);
        let rem = self.len % WORD_BITS;
        if rem != 0 {
            self.words[full] = (1u64 << rem) - 1;
        }
    }

    /// Size of the universe.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the universe is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of indices in the set.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    pub fn set_bit(&mut self, n: usize) {
        debug_assert!(n < self.len, "bit {n} outside universe of {}", self.len);
        self.words[n / WORD_BITS] |= 1u64 << (n % WORD_BITS);
    }

    #[inline]
    pub fn clear_bit(&mut self, n: usize) {
        debug_assert!(n < self.len, "bit {n} outside universe of {}", self.len);
        self.words[n / WORD_BITS] &= !(1u64 << (n % WORD_BITS));
    }

    /// Test index `n`. Indices outside the universe are never set.
    #[inline]
    pub fn is_set(&self, n: usize) -> bool {
        self.words
            .get(n / WORD_BITS)
            .is_some_and(|w| w & (1u64 << (n % WORD_BITS)) != 0)
    }

    /// Call `visit` for every index in the set, in ascending order.
    pub fn enumerate(&self, mut visit: impl FnMut(usize)) {
        for (k, &word) in self.words.iter().enumerate() {
            let mut v = word;
            while v != 0 {
                let j = v.trailing_zeros() as usize;
                visit(k * WORD_BITS + j);
                v &= v - 1;
            }
        }
    }

    /// Iterate over the indices in the set, in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            words: &self.words,
            index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    /// Dense `0`/`1` rendition of the set, one entry per index.
    pub fn to_array(&self) -> Vec<u8> {
        let mut xs = vec![0u8; self.len];
        self.enumerate(|k| xs[k] = 1);
        xs
    }
}

/// Iterator over the members of a [`Bitset`].
pub struct Iter<'a> {
    words: &'a [u64],
    index: usize,
    current: u64,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.current == 0 {
            self.index += 1;
            self.current = *self.words.get(self.index)?;
        }
        let j = self.current.trailing_zeros() as usize;
        self.current &= self.current - 1;
        Some(self.index * WORD_BITS + j)
    }
}

impl<'a> IntoIterator for &'a Bitset {
    type Item = usize;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl fmt::Display for Bitset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, k) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", k)?;
        }
        Ok(())
    }
}

/// Union of two sets over the larger of their universes.
pub fn union(a: &Bitset, b: &Bitset) -> Bitset {
    combine(a, b, |x, y| x | y)
}

/// Intersection of two sets over the larger of their universes.
pub fn intersection(a: &Bitset, b: &Bitset) -> Bitset {
    combine(a, b, |x, y| x & y)
}

fn combine(a: &Bitset, b: &Bitset, op: impl Fn(u64, u64) -> u64) -> Bitset {
    let mut result = Bitset::new(a.len.max(b.len), false);
    for (i, word) in result.words.iter_mut().enumerate() {
        let x = a.words.get(i).copied().unwrap_or(0);
        let y = b.words.get(i).copied().unwrap_or(0);
        *word = op(x, y);
    }
    result
}
