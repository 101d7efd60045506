//! Error types for slate-table-core
//!
//! Resolution and rule evaluation never fail: malformed persisted data
//! degrades to "no effect". These errors only come out of explicit parsing
//! and the diagnostic span check.

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in slate-table-core
#[derive(Debug, Error)]
pub enum Error {
    /// Snapshot JSON could not be decoded
    #[error("Invalid table JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Column key is neither `col:N` nor `leaf:N:a.b`
    #[error("Invalid column key: {0}")]
    InvalidColumnKey(String),

    /// Two merge anchors claim the same cell
    #[error("Merged region {first} overlaps merged region {second}")]
    MergedCellConflict { first: String, second: String },

    /// A `coveredBy` reference points outside the grid
    #[error("Cell {cell} is covered by {target}, which does not exist")]
    DanglingCover { cell: String, target: String },

    /// A `coveredBy` chain does not reach an uncovered cell within the hop guard
    #[error("Cover chain starting at {0} does not terminate")]
    CoverCycle(String),
}
