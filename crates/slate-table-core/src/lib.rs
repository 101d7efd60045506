//! # slate-table-core
//!
//! Grid model and conditional-formatting engine for the slate table widget.
//!
//! This crate provides:
//! - [`Table`], [`Row`], [`Cell`], [`SplitGrid`] - The persisted grid, with merges and splits
//! - [`resolve_covered`] - Following `coveredBy` links to their anchor
//! - [`infer_header_row_count`] - Header depth from a stale or missing hint
//! - [`ColumnCatalog`] - Stable column identities from nested headers
//! - [`RuleEngine`] and [`ColumnRuleSet`] - Prioritized conditional rules
//!
//! ## Example
//!
//! ```rust
//! use slate_table_core::{
//!     infer_header_row_count, CellPos, ColumnCatalog, ColumnRuleSet, ConditionRule, Row,
//!     RuleEngine, RuleOp, StylePatch, TextCache, ThenPatch,
//! };
//!
//! let rows = vec![
//!     Row::from_texts(&["Region", "Sales"]),
//!     Row::from_texts(&["north", "1200"]),
//! ];
//! let mut cache = TextCache::new();
//! let header = infer_header_row_count(&rows, Some(1), &mut cache);
//! let catalog = ColumnCatalog::build(&rows, header, &mut cache);
//!
//! let rules = vec![ColumnRuleSet::for_key("sales").with_rule(
//!     ConditionRule::new(RuleOp::GreaterThan, 1000)
//!         .with_then(ThenPatch::with_style(StylePatch::new().font_weight("bold"))),
//! )];
//! let engine = RuleEngine::new(&rules, &catalog);
//!
//! let patch = engine
//!     .then_for_cell(CellPos::new(1, 1), None, &rows[1].cells[1], header, &mut cache)
//!     .unwrap();
//! assert_eq!(patch.style().to_css(), "font-weight: bold");
//! ```

pub mod catalog;
pub mod cell;
pub mod conditional_format;
pub mod error;
pub mod header;
pub mod style;
pub mod table;
pub mod value;

// Re-exports for convenience
pub use catalog::{
    body_leaf_cells, build_catalog, BodyLeaf, ColumnCatalog, ColumnEntry, ColumnKind,
    ColumnTarget,
};
pub use cell::{
    resolve_cell, resolve_covered, Cell, CellPos, MergeSpan, Resolved, Row, SpanRange, SplitGrid,
};
pub use conditional_format::{
    conditional_then_for_cell, evaluate_rule_match, evaluate_rule_set, resolve_target,
    ColumnRuleSet, ConditionRule, Operand, RuleCondition, RuleEngine, RuleOp,
};
pub use error::{Error, Result};
pub use header::{infer_header_row_count, RowStats};
pub use style::{StylePatch, ThenPatch};
pub use table::Table;
pub use value::{ComparableValue, TextCache};
