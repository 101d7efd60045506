//! Table snapshot type

use serde::{Deserialize, Serialize};

use crate::cell::{resolve_covered, resolve_in_split, Cell, CellPos, Row, SpanRange, SplitGrid};
use crate::error::{Error, Result};

/// Split nesting followed by [`Table::check_spans`]
const MAX_CHECK_DEPTH: usize = 4;

/// A persisted table widget snapshot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Table {
    /// Rows, header rows first
    pub rows: Vec<Row>,
    /// Column layout weights (not interpreted here)
    pub column_fractions: Vec<f64>,
    /// Row layout weights (not interpreted here)
    pub row_fractions: Vec<f64>,
    /// Persisted header depth hint; may be stale or absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_row_count: Option<usize>,
    /// Whether cell borders are drawn
    pub show_borders: bool,
}

impl Table {
    /// Create a table from rows
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Set the persisted header depth hint
    pub fn with_header_row_count(mut self, count: usize) -> Self {
        self.header_row_count = Some(count);
        self
    }

    /// Decode a snapshot from the host's JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode this snapshot as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Number of top-level columns (the widest row)
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the cell at `(row, col)`
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row)?.cells.get(col)
    }

    /// Verify the span invariants of this snapshot
    ///
    /// Checks that no two merge anchors overlap and that every `coveredBy`
    /// chain ends at an uncovered cell, recursing into split sub-grids.
    /// Resolution never depends on this succeeding; it is a diagnostic for
    /// hosts and tooling.
    pub fn check_spans(&self) -> Result<()> {
        let grid: Vec<(CellPos, &Cell)> = self
            .rows
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.cells
                    .iter()
                    .enumerate()
                    .map(move |(c, cell)| (CellPos::new(r, c), cell))
            })
            .collect();

        check_grid(&grid, |pos| {
            resolve_covered(&self.rows, pos).map(|r| (r.pos, r.cell.is_covered()))
        })?;

        for (_, cell) in grid {
            if let Some(split) = &cell.split {
                check_split(split, 1)?;
            }
        }
        Ok(())
    }
}

fn check_split(split: &SplitGrid, depth: usize) -> Result<()> {
    if depth > MAX_CHECK_DEPTH {
        return Ok(());
    }

    let (rows, cols) = split.extent();
    let grid: Vec<(CellPos, &Cell)> = (0..rows)
        .flat_map(|r| (0..cols).map(move |c| CellPos::new(r, c)))
        .filter_map(|pos| split.cell_at(pos.row, pos.col).map(|cell| (pos, cell)))
        .collect();

    check_grid(&grid, |pos| {
        resolve_in_split(split, pos).map(|r| (r.pos, r.cell.is_covered()))
    })?;

    for (_, cell) in grid {
        if let Some(inner) = &cell.split {
            check_split(inner, depth + 1)?;
        }
    }
    Ok(())
}

fn check_grid<F>(grid: &[(CellPos, &Cell)], resolve: F) -> Result<()>
where
    F: Fn(CellPos) -> Option<(CellPos, bool)>,
{
    let mut spans: Vec<SpanRange> = Vec::new();
    for (pos, cell) in grid {
        if let Some(merge) = cell.merge.filter(|_| !cell.is_covered()) {
            let span = SpanRange::from_anchor(*pos, merge.row_span, merge.col_span);
            if let Some(existing) = spans.iter().find(|s| s.overlaps(&span)) {
                return Err(Error::MergedCellConflict {
                    first: existing.to_string(),
                    second: span.to_string(),
                });
            }
            spans.push(span);
        }
    }

    for (pos, cell) in grid {
        let Some(target) = cell.covered_by else {
            continue;
        };
        match resolve(*pos) {
            None => {
                return Err(Error::DanglingCover {
                    cell: pos.to_string(),
                    target: target.to_string(),
                })
            }
            Some((_, true)) => return Err(Error::CoverCycle(pos.to_string())),
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_json() {
        let json = r#"{
            "rows": [
                { "id": "r0", "cells": [ { "content": "A" }, { "content": "B" } ] },
                { "cells": [ { "content": "1" } ] }
            ],
            "headerRowCount": 1,
            "showBorders": true,
            "columnFractions": [0.5, 0.5]
        }"#;
        let table = Table::from_json(json).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.header_row_count, Some(1));
        assert!(table.show_borders);
        assert_eq!(table.cell(0, 1).unwrap().content, "B");
        assert!(table.cell(1, 1).is_none());
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(Table::from_json("{ rows: "), Err(Error::Json(_))));
    }

    #[test]
    fn test_json_roundtrip_keeps_metadata() {
        let table = Table::new(vec![Row::new(vec![
            Cell::new("a").with_merge(1, 2),
            Cell::covered(0, 0),
        ])])
        .with_header_row_count(1);

        let back = Table::from_json(&table.to_json().unwrap()).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_check_spans_ok() {
        let table = Table::new(vec![
            Row::new(vec![Cell::new("a").with_merge(2, 1), Cell::new("b")]),
            Row::new(vec![Cell::covered(0, 0), Cell::new("c")]),
        ]);
        assert!(table.check_spans().is_ok());
    }

    #[test]
    fn test_check_spans_overlap() {
        let table = Table::new(vec![
            Row::new(vec![Cell::new("a").with_merge(2, 2), Cell::covered(0, 0)]),
            Row::new(vec![Cell::covered(0, 0), Cell::new("x").with_merge(1, 1)]),
        ]);
        assert!(matches!(
            table.check_spans(),
            Err(Error::MergedCellConflict { .. })
        ));
    }

    #[test]
    fn test_check_spans_dangling_and_cycle() {
        let dangling = Table::new(vec![Row::new(vec![Cell::covered(3, 3)])]);
        assert!(matches!(
            dangling.check_spans(),
            Err(Error::DanglingCover { .. })
        ));

        let cycle = Table::new(vec![Row::new(vec![Cell::covered(0, 1), Cell::covered(0, 0)])]);
        assert!(matches!(cycle.check_spans(), Err(Error::CoverCycle(_))));
    }

    #[test]
    fn test_check_spans_oversized_split_and_merge() {
        let json = r#"{ "rows": [ { "cells": [
            { "content": "a", "merge": { "rowSpan": 18446744073709551615, "colSpan": 2 } },
            { "coveredBy": { "row": 0, "col": 0 } },
            { "split": { "rows": 1099511627776, "cols": 1099511627776,
                         "cells": [ { "coveredBy": { "row": 549755813888, "col": 0 } } ] } }
        ] } ] }"#;
        let table = Table::from_json(json).unwrap();
        assert!(matches!(
            table.check_spans(),
            Err(Error::DanglingCover { .. })
        ));
    }

    #[test]
    fn test_check_spans_inside_split() {
        let split = SplitGrid::new(1, 2, vec![Cell::new("a"), Cell::covered(0, 5)]);
        let table = Table::new(vec![Row::new(vec![Cell::split(split)])]);
        assert!(matches!(
            table.check_spans(),
            Err(Error::DanglingCover { .. })
        ));
    }
}
