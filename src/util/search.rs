/*!
Types describing where in a sequence a search looks and what it finds.
*/

use core::ops::Range;

/// A representation of a span reported by a matcher.
///
/// A span corresponds to the starting and ending _element index_ of a match
/// or capture group in a sequence. The start is inclusive and the end is
/// exclusive, so a span of one element `e` at index `i` is `i..i+1`.
///
/// This type is also used by [`SpanPredicate`](crate::SpanPredicate)
/// implementations to report candidate intervals.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Span {
    /// The start offset of the span, inclusive.
    pub start: usize,
    /// The end offset of the span, exclusive.
    pub end: usize,
}

impl Span {
    /// Create a new span from its start and end offsets.
    #[inline]
    pub fn new(start: usize, end: usize) -> Span {
        Span { start, end }
    }

    /// Returns this span as a range.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        Range::from(*self)
    }

    /// Returns the number of elements covered by this span.
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true when this span is empty. That is, when `start >= end`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Returns true when the given offset is contained within this span.
    ///
    /// Note that an empty span contains no offsets and will always return
    /// false.
    #[inline]
    pub fn contains(&self, offset: usize) -> bool {
        !self.is_empty() && self.start <= offset && offset < self.end
    }
}

impl<T> core::ops::Index<Span> for [T] {
    type Output = [T];

    #[inline]
    fn index(&self, index: Span) -> &[T] {
        &self[index.range()]
    }
}

impl From<Range<usize>> for Span {
    #[inline]
    fn from(range: Range<usize>) -> Span {
        Span { start: range.start, end: range.end }
    }
}

impl From<Span> for Range<usize> {
    #[inline]
    fn from(span: Span) -> Range<usize> {
        Range { start: span.start, end: span.end }
    }
}

impl PartialEq<Range<usize>> for Span {
    #[inline]
    fn eq(&self, range: &Range<usize>) -> bool {
        self.start == range.start && self.end == range.end
    }
}

impl PartialEq<Span> for Range<usize> {
    #[inline]
    fn eq(&self, span: &Span) -> bool {
        self.start == span.start && self.end == span.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_contains_excludes_end() {
        let sp = Span::new(2, 4);
        assert!(sp.contains(2));
        assert!(sp.contains(3));
        assert!(!sp.contains(4));
        assert!(!Span::new(3, 3).contains(3));
        assert_eq!(2, sp.len());
    }

    #[test]
    fn span_indexes_slices() {
        let seq = ["a", "b", "c", "d"];
        assert_eq!(&["b", "c"], &seq[..][Span::new(1, 3)]);
        assert_eq!(Span::new(1, 3), 1..3);
    }
}
