//! Source offsets.
//!
//! Every token and syntax node carries a [`Span`] so errors can point a caret
//! at the exact character that caused them.

use std::fmt;

/// Byte range inside an expression string.
///
/// `start` is inclusive, `end` exclusive. Expressions longer than `u32::MAX`
/// bytes are rejected by the parser configuration long before a span could
/// overflow.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Placeholder for synthesized nodes.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Build a span from a lexer byte range, saturating at `u32::MAX`.
    #[inline]
    pub fn from_range(range: std::ops::Range<usize>) -> Self {
        let start = u32::try_from(range.start).unwrap_or(u32::MAX);
        let end = u32::try_from(range.end).unwrap_or(u32::MAX);
        Span { start, end }
    }

    /// Zero-width span at `offset`.
    #[inline]
    pub const fn point(offset: u32) -> Span {
        Span {
            start: offset,
            end: offset,
        }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    #[inline]
    pub fn to_range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_covers_both() {
        let merged = Span::new(4, 9).merge(Span::new(1, 6));
        assert_eq!(merged, Span::new(1, 9));
        assert_eq!(merged.len(), 8);
    }

    #[test]
    fn point_is_empty() {
        assert!(Span::point(7).is_empty());
        assert_eq!(Span::point(7).to_range(), 7..7);
    }

    #[test]
    fn from_range_saturates() {
        let huge = u32::MAX as usize + 10;
        let span = Span::from_range(3..huge);
        assert_eq!(span.start, 3);
        assert_eq!(span.end, u32::MAX);
    }
}
