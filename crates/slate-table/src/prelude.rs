//! Prelude module - common imports for slate-table users
//!
//! ```rust
//! use slate_table::prelude::*;
//! ```

pub use crate::{
    // Grid model
    Cell,
    CellPos,
    // Column catalog
    ColumnCatalog,
    ColumnEntry,
    ColumnKind,
    // Rules
    ColumnRuleSet,
    ColumnTarget,
    ConditionRule,
    // Error types
    Error,
    // Service
    GridOptions,
    MergeSpan,
    Operand,
    Result,
    Row,
    RuleOp,
    SplitGrid,
    StylePatch,
    Table,
    TableGrid,
    ThenPatch,
};
