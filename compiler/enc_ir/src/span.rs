//! Source location spans.
//!
//! Compact 8-byte byte-offset ranges. Old-tree spans are in old document
//! coordinates; new-tree spans are in new document coordinates.

use std::fmt;

/// Source location span.
///
/// Layout: 8 bytes total
/// - start: u32 - byte offset from file start
/// - end: u32 - byte offset (exclusive)
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(C)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Dummy span for synthesized declarations.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    /// Create a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if another span is fully contained within this span.
    #[inline]
    pub fn contains_span(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Move the span by a signed byte delta, saturating at zero.
    #[inline]
    #[must_use]
    pub fn shifted(self, delta: i64) -> Span {
        let shift = |pos: u32| -> u32 {
            let moved = (i64::from(pos) + delta).clamp(0, i64::from(u32::MAX));
            u32::try_from(moved).unwrap_or(u32::MAX)
        };
        Span::new(shift(self.start), shift(self.end))
    }

    /// Re-anchor a span from one enclosing region to another, keeping its
    /// offset relative to the region start.
    #[inline]
    #[must_use]
    pub fn rebase(self, from: Span, to: Span) -> Span {
        self.shifted(i64::from(to.start) - i64::from(from.start))
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
    fn contains_span_is_inclusive() {
        let outer = Span::new(10, 20);
        assert!(outer.contains_span(Span::new(10, 20)));
        assert!(outer.contains_span(Span::new(12, 15)));
        assert!(!outer.contains_span(Span::new(9, 15)));
    }

    #[test]
    fn rebase_keeps_relative_offset() {
        let stmt = Span::new(105, 110);
        let moved = stmt.rebase(Span::new(100, 200), Span::new(300, 400));
        assert_eq!(moved, Span::new(305, 310));
    }

    #[test]
    fn shifted_saturates_at_zero() {
        assert_eq!(Span::new(3, 8).shifted(-5), Span::new(0, 3));
    }
}
