//! # slate-table
//!
//! Tables with merged cells, split cells and multi-row headers, plus the
//! conditional-formatting rules bound to their columns.
//!
//! ## Features
//!
//! - Decode persisted table and rule-set JSON
//! - Resolve covered cells to their merge anchors
//! - Infer header depth when the persisted count is stale or missing
//! - Build a column catalog from nested headers, including split sub-columns
//! - Evaluate prioritized rules into per-cell style, class and tooltip
//!
//! ## Example
//!
//! ```rust
//! use slate_table::prelude::*;
//!
//! let json = r#"{
//!     "rows": [
//!         { "cells": [ { "content": "<b>Name</b>" }, { "content": "Score" } ] },
//!         { "cells": [ { "content": "ada" }, { "content": "97" } ] }
//!     ],
//!     "headerRowCount": 1
//! }"#;
//! let mut grid = TableGrid::from_json(json).unwrap();
//! grid.set_rule_sets(vec![ColumnRuleSet::for_key("score").with_rule(
//!     ConditionRule::new(RuleOp::GreaterThanOrEqual, 90)
//!         .with_then(ThenPatch::with_style(StylePatch::new().background_color("#c6efce"))),
//! )]);
//!
//! let names: Vec<_> = grid.column_entries().iter().map(|e| e.name.clone()).collect();
//! assert_eq!(names, ["Name", "Score"]);
//!
//! let style = grid.cell_style(CellPos::new(1, 1), None).unwrap();
//! assert_eq!(style.to_css(), "background-color: #c6efce");
//! ```

pub mod grid;
pub mod prelude;

pub use grid::{CellDecision, GridOptions, TableGrid};

// Re-export core types
pub use slate_table_core::{
    body_leaf_cells,
    build_catalog,
    // Rule engine
    conditional_then_for_cell,
    evaluate_rule_match,
    evaluate_rule_set,
    infer_header_row_count,
    resolve_cell,
    resolve_covered,
    resolve_target,
    BodyLeaf,
    // Grid model
    Cell,
    CellPos,
    // Column catalog
    ColumnCatalog,
    ColumnEntry,
    ColumnKind,
    ColumnRuleSet,
    ColumnTarget,
    ComparableValue,
    ConditionRule,
    // Error types
    Error,
    MergeSpan,
    Operand,
    Resolved,
    Result,
    Row,
    RowStats,
    RuleCondition,
    RuleEngine,
    RuleOp,
    SpanRange,
    SplitGrid,
    StylePatch,
    Table,
    TextCache,
    ThenPatch,
};

// Re-export modules for advanced usage
pub use slate_table_core::{catalog, cell, conditional_format, header, style, value};
