//! Covered-cell resolution
//!
//! Follows `coveredBy` references to the cell that owns a span. Persisted
//! documents can contain dangling or cyclic references, so the walk is an
//! explicit loop with a hop counter instead of trusting acyclicity.

use super::{Cell, CellPos, Row, SplitGrid};

/// Maximum number of `coveredBy` hops followed before giving up
pub const MAX_COVER_HOPS: usize = 6;

/// The outcome of following a cover chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<'a> {
    /// Position of the resolved cell
    pub pos: CellPos,
    /// The resolved cell (an anchor or plain cell, unless the guard tripped)
    pub cell: &'a Cell,
    /// Number of references followed
    pub hops: usize,
}

/// Look up a top-level cell by position
pub fn cell_at(rows: &[Row], pos: CellPos) -> Option<&Cell> {
    rows.get(pos.row)?.cells.get(pos.col)
}

/// Resolve the top-level cell at `pos` to its owning cell
///
/// Returns `None` if `pos` or any reference along the chain is out of range.
/// If the chain is longer than [`MAX_COVER_HOPS`] the last cell reached is
/// returned as-is.
pub fn resolve_covered(rows: &[Row], pos: CellPos) -> Option<Resolved<'_>> {
    let cell = cell_at(rows, pos)?;
    follow(pos, cell, |p| cell_at(rows, p))
}

/// Resolve `cell` (taken from `rows`) to its owning cell
pub fn resolve_cell<'a>(rows: &'a [Row], cell: &'a Cell) -> Option<&'a Cell> {
    follow(CellPos::new(0, 0), cell, |p| cell_at(rows, p)).map(|r| r.cell)
}

/// Resolve the sub-cell at `pos` inside a split sub-grid
///
/// References inside a split use split-local coordinates.
pub fn resolve_in_split(split: &SplitGrid, pos: CellPos) -> Option<Resolved<'_>> {
    let cell = split.cell_at(pos.row, pos.col)?;
    follow(pos, cell, |p| split.cell_at(p.row, p.col))
}

fn follow<'a, F>(start: CellPos, cell: &'a Cell, lookup: F) -> Option<Resolved<'a>>
where
    F: Fn(CellPos) -> Option<&'a Cell>,
{
    let mut resolved = Resolved {
        pos: start,
        cell,
        hops: 0,
    };

    while let Some(target) = resolved.cell.covered_by {
        if resolved.hops >= MAX_COVER_HOPS {
            tracing::debug!(
                "cover chain from {} exceeded {} hops, stopping at {}",
                start,
                MAX_COVER_HOPS,
                resolved.pos
            );
            break;
        }
        resolved = Resolved {
            pos: target,
            cell: lookup(target)?,
            hops: resolved.hops + 1,
        };
    }

    Some(resolved)
}
