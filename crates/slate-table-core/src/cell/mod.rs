//! Cell-related types and utilities
//!
//! This module contains:
//! - [`Cell`], [`Row`], [`SplitGrid`], [`MergeSpan`] - The persisted grid shape
//! - [`CellPos`] and [`SpanRange`] - Positions and merge rectangles
//! - [`resolve_covered`] - Bounded `coveredBy` resolution

mod model;
mod position;
mod resolve;

pub use model::{Cell, MergeSpan, Row, SplitGrid};
pub use position::{CellPos, SpanRange};
pub use resolve::{
    cell_at, resolve_cell, resolve_covered, resolve_in_split, Resolved, MAX_COVER_HOPS,
};
