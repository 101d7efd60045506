//! Header depth inference
//!
//! The persisted `headerRowCount` can be stale or missing, so the number of
//! leading header rows is inferred in two stages:
//!
//! 1. A metadata floor: leading rows that carry at least one uncovered merge
//!    anchor, capped at [`MAX_HEADER_METADATA_ROWS`]. The floor then extends
//!    through rows that name the sub-columns of a multi-column group ending
//!    right above them (`geo` over `lat | lng`). A tall `rowSpan` alone never
//!    extends it, since header merges may run down into body rows.
//! 2. A body cap: every candidate row past the persisted count is checked
//!    for mostly-numeric content; the first such row ends the header.
//!
//! The ratios in [`RowStats::looks_like_body`] are compatibility values.
//! Existing documents depend on the depth they produce.

use crate::cell::{Cell, Row};
use crate::value::{is_numeric_like, TextCache};

/// Maximum number of rows the metadata floor can claim
pub const MAX_HEADER_METADATA_ROWS: usize = 4;

/// Split nesting followed when collecting a row's values
const MAX_SPLIT_SCAN_DEPTH: usize = 4;

/// Non-empty and numeric-looking value counts of one row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowStats {
    /// Values with non-empty text
    pub non_empty: usize,
    /// Non-empty values matching the numeric-looking pattern
    pub numeric: usize,
}

impl RowStats {
    /// Collect the stats of a row
    ///
    /// Covered cells are skipped. A split cell contributes each of its
    /// sub-cells' texts instead of its own content.
    pub fn of_row(row: &Row, cache: &mut TextCache) -> Self {
        let mut stats = Self::default();
        for cell in row.cells.iter().filter(|c| !c.is_covered()) {
            stats.add_cell(cell, cache, 0);
        }
        stats
    }

    fn add_cell(&mut self, cell: &Cell, cache: &mut TextCache, depth: usize) {
        match &cell.split {
            Some(split) => {
                if depth >= MAX_SPLIT_SCAN_DEPTH {
                    return;
                }
                for sub in split.cells.iter().filter(|c| !c.is_covered()) {
                    self.add_cell(sub, cache, depth + 1);
                }
            }
            None => {
                let text = cache.text(&cell.content);
                if !text.is_empty() {
                    self.non_empty += 1;
                    if is_numeric_like(text) {
                        self.numeric += 1;
                    }
                }
            }
        }
    }

    /// Fraction of non-empty values that look numeric
    pub fn numeric_ratio(&self) -> f64 {
        if self.non_empty == 0 {
            return 0.0;
        }
        self.numeric as f64 / self.non_empty as f64
    }

    /// Check if the row reads as body data
    pub fn looks_like_body(&self) -> bool {
        let ratio = self.numeric_ratio();
        (self.non_empty >= 1 && ratio >= 0.9) || (self.non_empty >= 2 && ratio >= 0.7)
    }
}

/// Stage 1: leading rows holding at least one uncovered merge anchor
pub fn metadata_header_floor(rows: &[Row]) -> usize {
    rows.iter()
        .take(MAX_HEADER_METADATA_ROWS)
        .take_while(|row| row.cells.iter().any(is_header_anchor))
        .count()
}

/// Extend `floor` through rows naming the sub-columns of a grouped header
///
/// Capped at [`MAX_HEADER_METADATA_ROWS`] and the row count.
pub fn sub_column_extent(rows: &[Row], floor: usize) -> usize {
    let limit = MAX_HEADER_METADATA_ROWS.min(rows.len());
    let mut depth = floor.min(limit);
    while depth < limit && names_sub_columns(rows, depth) {
        depth += 1;
    }
    depth
}

/// Row `r` has an uncovered cell under a multi-column anchor whose span ends
/// right above it
fn names_sub_columns(rows: &[Row], r: usize) -> bool {
    let Some(row) = rows.get(r) else {
        return false;
    };
    rows[..r].iter().enumerate().any(|(ar, above)| {
        above.cells.iter().enumerate().any(|(ac, cell)| match cell.merge {
            Some(m) if is_header_anchor(cell) && m.col_span > 1 => {
                ar.saturating_add(m.row_span.max(1)) == r
                    && row.cells.iter().skip(ac).take(m.col_span).any(|c| !c.is_covered())
            }
            _ => false,
        })
    })
}

fn is_header_anchor(cell: &Cell) -> bool {
    cell.merge.is_some() && cell.covered_by.is_none()
}

/// Infer how many leading rows are header rows
///
/// Rows below `persisted` are trusted as header rows. The result never
/// exceeds `rows.len()`.
pub fn infer_header_row_count(
    rows: &[Row],
    persisted: Option<usize>,
    cache: &mut TextCache,
) -> usize {
    let persisted = persisted.unwrap_or(0).min(rows.len());
    let floor = sub_column_extent(rows, metadata_header_floor(rows));
    let candidate = persisted.max(floor).min(rows.len());

    for (r, row) in rows.iter().enumerate().take(candidate).skip(persisted) {
        let stats = RowStats::of_row(row, cache);
        tracing::trace!(
            "header candidate row {}: {} non-empty, {} numeric",
            r,
            stats.non_empty,
            stats.numeric
        );
        if stats.looks_like_body() {
            tracing::debug!("row {} reads as body, header depth capped at {}", r, r);
            return r;
        }
    }

    candidate
}
