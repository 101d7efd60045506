//! Persisted cell and row types
//!
//! These mirror the JSON the host document model stores for a table widget.
//! Field names follow the host's camelCase spelling; anything missing takes
//! its default and unknown fields are ignored.

use serde::{Deserialize, Deserializer, Serialize};

use super::CellPos;

/// A single table cell
///
/// Exactly one of plain `content` and `split` is meaningful: when `split` is
/// present the cell renders its sub-grid and its own content is ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cell {
    /// Host identity of the cell
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Rich-text markup, opaque to this crate apart from text extraction
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
    /// Present on the anchor (top-left) cell of a spanned region
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeSpan>,
    /// Present on cells inside another cell's span
    #[serde(skip_serializing_if = "Option::is_none")]
    pub covered_by: Option<CellPos>,
    /// Independent sub-grid replacing this cell's content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitGrid>,
}

impl Cell {
    /// Create a plain cell with the given markup
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Create an empty cell covered by the anchor at `(row, col)`
    pub fn covered(row: usize, col: usize) -> Self {
        Self {
            covered_by: Some(CellPos::new(row, col)),
            ..Self::default()
        }
    }

    /// Create a cell holding a split sub-grid
    pub fn split(split: SplitGrid) -> Self {
        Self {
            split: Some(split),
            ..Self::default()
        }
    }

    /// Set the host identity
    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = id.into();
        self
    }

    /// Make this cell the anchor of a `row_span` x `col_span` region
    pub fn with_merge(mut self, row_span: usize, col_span: usize) -> Self {
        self.merge = Some(MergeSpan { row_span, col_span });
        self
    }

    /// Mark this cell as covered by the anchor at `(row, col)`
    pub fn with_covered_by(mut self, row: usize, col: usize) -> Self {
        self.covered_by = Some(CellPos::new(row, col));
        self
    }

    /// Check if this cell anchors a merge
    pub fn is_anchor(&self) -> bool {
        self.merge.is_some()
    }

    /// Check if this cell is inside another cell's span
    pub fn is_covered(&self) -> bool {
        self.covered_by.is_some()
    }

    /// Check if this cell holds a sub-grid
    pub fn is_split(&self) -> bool {
        self.split.is_some()
    }
}

/// Row/column extent of a merge anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergeSpan {
    /// Rows spanned (including the anchor's own)
    pub row_span: usize,
    /// Columns spanned (including the anchor's own)
    pub col_span: usize,
}

impl Default for MergeSpan {
    fn default() -> Self {
        Self {
            row_span: 1,
            col_span: 1,
        }
    }
}

/// A `rows x cols` sub-grid stored row-major inside a split cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SplitGrid {
    /// Number of sub-rows
    pub rows: usize,
    /// Number of sub-columns
    pub cols: usize,
    /// Sub-cells, row-major
    pub cells: Vec<Cell>,
    /// Layout weights of the sub-columns (not interpreted here)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub column_fractions: Vec<f64>,
    /// Layout weights of the sub-rows (not interpreted here)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub row_fractions: Vec<f64>,
}

impl Default for SplitGrid {
    fn default() -> Self {
        Self {
            rows: 1,
            cols: 1,
            cells: Vec::new(),
            column_fractions: Vec::new(),
            row_fractions: Vec::new(),
        }
    }
}

impl SplitGrid {
    /// Create a sub-grid from row-major cells
    pub fn new(rows: usize, cols: usize, cells: Vec<Cell>) -> Self {
        Self {
            rows,
            cols,
            cells,
            ..Self::default()
        }
    }

    /// Create a sub-grid of plain text cells, row-major
    pub fn from_texts(rows: usize, cols: usize, texts: &[&str]) -> Self {
        Self::new(rows, cols, texts.iter().map(|t| Cell::new(*t)).collect())
    }

    /// Get the sub-cell at `(row, col)`, if it exists
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&Cell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let idx = row.checked_mul(self.cols)?.checked_add(col)?;
        self.cells.get(idx)
    }

    /// Sub-rows and sub-columns that can hold a stored cell
    ///
    /// The persisted `rows`/`cols` are clamped to what `cells` fills, so
    /// iterating the extent is bounded by the number of stored cells.
    pub fn extent(&self) -> (usize, usize) {
        if self.cols == 0 || self.rows == 0 {
            return (0, 0);
        }
        let stored = self.cells.len();
        let rows = self.rows.min(stored.div_ceil(self.cols));
        let cols = self.cols.min(stored);
        (rows, cols)
    }
}

/// One table row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Row {
    /// Host identity of the row
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Cells, one per top-level column
    pub cells: Vec<Cell>,
}

impl Row {
    /// Create a row from cells
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            id: String::new(),
            cells,
        }
    }

    /// Create a row of plain text cells
    pub fn from_texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Cell::new(*t)).collect())
    }

    /// Get the cell at `col`
    pub fn cell(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_host_json() {
        let json = r#"{
            "id": "c1",
            "content": "<b>Total</b>",
            "merge": { "rowSpan": 2, "colSpan": 3 },
            "style": { "ignored": true }
        }"#;
        let cell: Cell = serde_json::from_str(json).unwrap();

        assert_eq!(cell.id, "c1");
        assert_eq!(cell.content, "<b>Total</b>");
        assert_eq!(
            cell.merge,
            Some(MergeSpan {
                row_span: 2,
                col_span: 3
            })
        );
        assert!(cell.covered_by.is_none());
    }

    #[test]
    fn test_null_content_and_covered_by() {
        let json = r#"{ "content": null, "coveredBy": { "row": 0, "col": 1 } }"#;
        let cell: Cell = serde_json::from_str(json).unwrap();

        assert_eq!(cell.content, "");
        assert_eq!(cell.covered_by, Some(CellPos::new(0, 1)));
    }

    #[test]
    fn test_split_cell_at() {
        let split = SplitGrid::from_texts(2, 2, &["f", "s", "b", "r"]);

        assert_eq!(split.cell_at(0, 1).map(|c| c.content.as_str()), Some("s"));
        assert_eq!(split.cell_at(1, 0).map(|c| c.content.as_str()), Some("b"));
        assert!(split.cell_at(2, 0).is_none());
        assert!(split.cell_at(0, 2).is_none());
    }

    #[test]
    fn test_split_cell_at_short_cells() {
        let split = SplitGrid::new(2, 2, vec![Cell::new("only")]);
        assert!(split.cell_at(1, 1).is_none());
    }

    #[test]
    fn test_split_cell_at_huge_dimensions() {
        let huge = 1usize << 40;
        let split = SplitGrid::new(huge, huge, vec![Cell::covered(huge / 2, 0)]);

        assert!(split.cell_at(huge / 2, 0).is_none());
        assert!(split.cell_at(0, 0).is_some());
        assert_eq!(split.extent(), (1, 1));
    }

    #[test]
    fn test_split_extent() {
        assert_eq!(SplitGrid::from_texts(2, 2, &["a", "b", "c", "d"]).extent(), (2, 2));
        assert_eq!(SplitGrid::from_texts(3, 2, &["a", "b", "c"]).extent(), (2, 2));
        assert_eq!(SplitGrid::new(1, 3_000_000, Vec::new()).extent(), (0, 0));
        assert_eq!(SplitGrid::from_texts(0, 2, &["a"]).extent(), (0, 0));
    }

    #[test]
    fn test_serialize_skips_absent_metadata() {
        let json = serde_json::to_string(&Cell::new("x")).unwrap();
        assert_eq!(json, r#"{"id":"","content":"x"}"#);
    }
}
