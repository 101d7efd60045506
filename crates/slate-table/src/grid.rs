//! Per-table grid service
//!
//! [`TableGrid`] owns one table snapshot, the rule sets bound to it and the
//! markup cache shared by every resolution call. The header depth and the
//! column catalog are computed on first use and reset when the snapshot
//! changes; the markup cache survives snapshot changes and is only dropped
//! by [`TableGrid::clear_cache`].
//!
//! # Example
//!
//! ```rust
//! use slate_table::prelude::*;
//!
//! let table = Table::new(vec![
//!     Row::from_texts(&["Task", "Status"]),
//!     Row::from_texts(&["ship", "late"]),
//! ])
//! .with_header_row_count(1);
//!
//! let mut grid = TableGrid::new(table);
//! grid.set_rule_sets(vec![ColumnRuleSet::for_key("status").with_rule(
//!     ConditionRule::new(RuleOp::Equals, "LATE").with_then(ThenPatch::new().cell_class("warn")),
//! )]);
//!
//! assert_eq!(grid.cell_class(CellPos::new(1, 1), None).as_deref(), Some("warn"));
//! assert_eq!(grid.cell_class(CellPos::new(0, 1), None), None);
//! ```

use serde::Serialize;
use slate_table_core::{
    body_leaf_cells, infer_header_row_count, Cell, CellPos, ColumnCatalog, ColumnEntry,
    ColumnRuleSet, Result, RuleEngine, StylePatch, Table, TextCache, ThenPatch,
};

/// Options for a [`TableGrid`]
#[derive(Debug, Clone)]
pub struct GridOptions {
    /// Infer the header depth instead of trusting the persisted count
    pub infer_header_rows: bool,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            infer_header_rows: true,
        }
    }
}

/// The conditional patch resolved for one rendered cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDecision {
    /// Top-level position
    pub pos: CellPos,
    /// Leaf sub-column the cell renders under, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf_path: Option<Vec<usize>>,
    /// Merged patch
    pub then: ThenPatch,
}

/// One table widget's resolution state
#[derive(Debug, Default)]
pub struct TableGrid {
    table: Table,
    rule_sets: Vec<ColumnRuleSet>,
    options: GridOptions,
    cache: TextCache,
    header_row_count: Option<usize>,
    catalog: Option<ColumnCatalog>,
}

impl TableGrid {
    /// Create a grid with default options
    pub fn new(table: Table) -> Self {
        Self::with_options(table, GridOptions::default())
    }

    /// Create a grid with custom options
    pub fn with_options(table: Table, options: GridOptions) -> Self {
        Self {
            table,
            options,
            ..Self::default()
        }
    }

    /// Create a grid from a persisted snapshot
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(Table::from_json(json)?))
    }

    /// The table snapshot
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Replace the table snapshot
    pub fn set_table(&mut self, table: Table) {
        self.table = table;
        self.header_row_count = None;
        self.catalog = None;
    }

    /// The grid options
    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    /// The bound rule sets
    pub fn rule_sets(&self) -> &[ColumnRuleSet] {
        &self.rule_sets
    }

    /// Replace the bound rule sets
    pub fn set_rule_sets(&mut self, rule_sets: Vec<ColumnRuleSet>) {
        self.rule_sets = rule_sets;
    }

    /// Replace the bound rule sets from the host's JSON
    pub fn set_rule_sets_json(&mut self, json: &str) -> Result<()> {
        self.rule_sets = ColumnRuleSet::list_from_json(json)?;
        Ok(())
    }

    /// Number of leading header rows
    pub fn header_row_count(&mut self) -> usize {
        if let Some(count) = self.header_row_count {
            return count;
        }

        let rows = &self.table.rows;
        let persisted = self.table.header_row_count;
        let count = if self.options.infer_header_rows {
            infer_header_row_count(rows, persisted, &mut self.cache)
        } else {
            persisted.unwrap_or(0).min(rows.len())
        };
        if persisted != Some(count) {
            tracing::debug!(
                "header depth {} differs from persisted {:?}",
                count,
                persisted
            );
        }

        self.header_row_count = Some(count);
        count
    }

    /// Column catalog of the current snapshot
    pub fn catalog(&mut self) -> &ColumnCatalog {
        let header = self.header_row_count();
        let (rows, cache) = (&self.table.rows, &mut self.cache);
        self.catalog
            .get_or_insert_with(|| ColumnCatalog::build(rows, header, cache))
    }

    /// Column entries of the current snapshot
    pub fn column_entries(&mut self) -> &[ColumnEntry] {
        self.catalog().entries()
    }

    /// Merged conditional patch for the cell rendered at `pos`
    ///
    /// `leaf_path` selects the rendered sub-cell of a split body cell.
    /// Header rows, covered cells and unknown positions yield `None`.
    pub fn conditional_then(
        &mut self,
        pos: CellPos,
        leaf_path: Option<&[usize]>,
    ) -> Option<ThenPatch> {
        let header = self.header_row_count();
        if pos.row < header || self.rule_sets.is_empty() {
            return None;
        }
        self.catalog();

        let catalog = self.catalog.as_ref()?;
        let cell = rendered_cell(&self.table, pos, leaf_path)?;
        RuleEngine::new(&self.rule_sets, catalog).then_for_cell(
            pos,
            leaf_path,
            cell,
            header,
            &mut self.cache,
        )
    }

    /// Conditional style patch of a cell
    pub fn cell_style(&mut self, pos: CellPos, leaf_path: Option<&[usize]>) -> Option<StylePatch> {
        self.conditional_then(pos, leaf_path)
            .map(|then| then.style)
            .filter(|style| !style.is_empty())
    }

    /// Conditional CSS class of a cell
    pub fn cell_class(&mut self, pos: CellPos, leaf_path: Option<&[usize]>) -> Option<String> {
        self.conditional_then(pos, leaf_path)?
            .class_name()
            .map(str::to_string)
    }

    /// Conditional tooltip of a cell
    pub fn cell_tooltip(&mut self, pos: CellPos, leaf_path: Option<&[usize]>) -> Option<String> {
        self.conditional_then(pos, leaf_path)?
            .tooltip_text()
            .map(str::to_string)
    }

    /// Resolve every rendered body cell that ends up with a patch
    ///
    /// Split body cells are visited per sub-cell with their leaf paths.
    pub fn evaluate_all(&mut self) -> Vec<CellDecision> {
        let header = self.header_row_count();
        self.catalog();

        let mut decisions = Vec::new();
        let Some(catalog) = self.catalog.as_ref() else {
            return decisions;
        };
        let engine = RuleEngine::new(&self.rule_sets, catalog);
        if engine.is_empty() {
            return decisions;
        }

        for (r, row) in self.table.rows.iter().enumerate().skip(header) {
            for (c, cell) in row.cells.iter().enumerate() {
                if cell.is_covered() {
                    continue;
                }
                let pos = CellPos::new(r, c);

                if cell.is_split() {
                    for leaf in body_leaf_cells(cell) {
                        let path = (!leaf.leaf_path.is_empty()).then_some(leaf.leaf_path.as_slice());
                        if let Some(then) =
                            engine.then_for_cell(pos, path, leaf.cell, header, &mut self.cache)
                        {
                            decisions.push(CellDecision {
                                pos,
                                leaf_path: path.map(<[usize]>::to_vec),
                                then,
                            });
                        }
                    }
                } else if let Some(then) =
                    engine.then_for_cell(pos, None, cell, header, &mut self.cache)
                {
                    decisions.push(CellDecision {
                        pos,
                        leaf_path: None,
                        then,
                    });
                }
            }
        }
        decisions
    }

    /// Verify the span invariants of the snapshot
    pub fn check(&self) -> Result<()> {
        self.table.check_spans()
    }

    /// Number of cached markup strings
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop the markup cache; call when the widget is torn down
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

fn rendered_cell<'a>(table: &'a Table, pos: CellPos, leaf_path: Option<&[usize]>) -> Option<&'a Cell> {
    let cell = table.cell(pos.row, pos.col)?;
    if cell.is_covered() {
        return None;
    }
    match leaf_path {
        Some(path) if cell.is_split() => body_leaf_cells(cell)
            .into_iter()
            .find(|leaf| leaf.leaf_path == path)
            .map(|leaf| leaf.cell),
        _ => Some(cell),
    }
}
