//! Byte spans against the original, unmodified source buffer

use serde::{Deserialize, Serialize};

/// Contiguous byte range of the original source buffer
///
/// Spans are never re-based onto an edited buffer. Every edit produced by the
/// rewrite pass refers to positions in the buffer the front end parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    /// Byte offset of the start of the span (inclusive)
    pub start: usize,
    /// Byte offset of the end of the span (exclusive)
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        SourceSpan { start, end }
    }

    /// Check if `offset` lies strictly between the span's bounds
    pub fn strictly_contains_offset(&self, offset: usize) -> bool {
        self.start < offset && offset < self.end
    }

    /// Whether the two spans share at least one byte
    ///
    /// Touching spans share none, and an empty span shares none with anything.
    pub fn overlaps(&self, other: &SourceSpan) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }

    /// Borrow the text this span covers
    ///
    /// Returns `None` when the span is backwards, out of bounds, or cuts
    /// through a UTF-8 sequence.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        if self.start > self.end {
            return None;
        }
        source.get(self.start..self.end)
    }
}

impl std::fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
