//! Defines a [`Span`] which is used to represent a region in the template
//! source code.

use std::cmp::{max, min};
use std::ops::{Index, Range};

/// A region of the template source, as byte offsets `m..n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Span {
    /// The start offset (inclusive).
    pub m: usize,
    /// The end offset (exclusive).
    pub n: usize,
}

impl Span {
    /// Construct a new span.
    #[inline]
    pub const fn new(m: usize, n: usize) -> Self {
        Self { m, n }
    }

    /// An empty span at the given offset.
    #[inline]
    pub const fn empty(at: usize) -> Self {
        Self { m: at, n: at }
    }

    /// Returns the smallest span covering both `self` and `other`.
    pub fn combine(self, other: Self) -> Self {
        let m = min(self.m, other.m);
        let n = max(self.n, other.n);
        Self { m, n }
    }

    /// The length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.n - self.m
    }

    /// Whether the span covers no bytes.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.m == self.n
    }
}

impl Index<Span> for str {
    type Output = str;

    fn index(&self, span: Span) -> &Self::Output {
        let Span { m, n } = span;
        &self[m..n]
    }
}

impl From<Range<usize>> for Span {
    fn from(r: Range<usize>) -> Self {
        Self {
            m: r.start,
            n: r.end,
        }
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.m..span.n
    }
}
