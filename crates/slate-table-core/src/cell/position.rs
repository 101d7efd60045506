//! Cell positions and span rectangles

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell position inside a grid (0-based row and column)
///
/// This is also the persisted shape of a `coveredBy` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    /// Row index
    pub row: usize,
    /// Column index
    pub col: usize,
}

impl CellPos {
    /// Create a new position
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Column letters of a 0-based index (0 is `A`, 26 is `AA`)
    pub fn column_to_letters(col: usize) -> String {
        let mut letters = Vec::new();
        let mut rest = Some(col);
        while let Some(n) = rest {
            letters.push(b'A' + (n % 26) as u8);
            rest = (n / 26).checked_sub(1);
        }
        letters.iter().rev().map(|&b| b as char).collect()
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::column_to_letters(self.col), self.row.saturating_add(1))
    }
}

/// The inclusive rectangle claimed by a merge anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanRange {
    /// Anchor (top-left)
    pub start: CellPos,
    /// Bottom-right corner
    pub end: CellPos,
}

impl SpanRange {
    /// Span of `row_span` x `col_span` cells anchored at `start`
    ///
    /// Zero spans are treated as 1; oversized spans stop at `usize::MAX`.
    pub fn from_anchor(start: CellPos, row_span: usize, col_span: usize) -> Self {
        Self {
            start,
            end: CellPos::new(
                start.row.saturating_add(row_span.max(1) - 1),
                start.col.saturating_add(col_span.max(1) - 1),
            ),
        }
    }

    /// Check if this span overlaps with another
    pub fn overlaps(&self, other: &SpanRange) -> bool {
        self.start.row <= other.end.row
            && self.end.row >= other.start.row
            && self.start.col <= other.end.col
            && self.end.col >= other.start.col
    }
}

impl fmt::Display for SpanRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}
