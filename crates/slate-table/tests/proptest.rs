//! Property-based tests for slate-table using proptest.

use proptest::prelude::*;
use slate_table::cell::MAX_COVER_HOPS;
use slate_table::{
    build_catalog, conditional_then_for_cell, evaluate_rule_match, infer_header_row_count,
    resolve_covered, Cell, CellPos, ColumnCatalog, ColumnKind, ColumnRuleSet, ComparableValue,
    ConditionRule, Operand, Row, RuleCondition, RuleOp, SplitGrid, Table, TableGrid, TextCache,
    ThenPatch,
};

// ============================================================================
// Strategies
// ============================================================================

fn text_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "", "10", "20", "3.5", "1,000", "-7", "a", "Name", "<b>x</b> y", "2024-01-05",
    ])
    .prop_map(String::from)
}

fn plain_cell_strategy() -> impl Strategy<Value = Cell> {
    prop_oneof![
        3 => text_strategy().prop_map(Cell::new),
        1 => (text_strategy(), 1usize..4, 1usize..4)
            .prop_map(|(t, r, c)| Cell::new(t).with_merge(r, c)),
        1 => (0usize..8, 0usize..8).prop_map(|(r, c)| Cell::covered(r, c)),
    ]
}

/// Cells with arbitrary (possibly dangling or cyclic) covers and nested splits
fn cell_strategy() -> impl Strategy<Value = Cell> {
    plain_cell_strategy().prop_recursive(5, 48, 6, |inner| {
        (1usize..4, 1usize..4, prop::collection::vec(inner, 0..7))
            .prop_map(|(r, c, cells)| Cell::split(SplitGrid::new(r, c, cells)))
    })
}

fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(prop::collection::vec(cell_strategy(), 0..6).prop_map(Row::new), 0..7)
}

fn op_strategy() -> impl Strategy<Value = RuleOp> {
    prop::sample::select(vec![
        "isEmpty", "isNotEmpty", "equals", "notEquals", "equalsIgnoreCase", "contains",
        "notContains", "startsWith", "endsWith", "inList", "notInList", "greaterThan",
        "greaterThanOrEqual", "lessThan", "lessThanOrEqual", "between", "notBetween", "before",
        "after", "on", "betweenDates", "matches",
    ])
    .prop_map(RuleOp::from_name)
}

fn operand_strategy() -> impl Strategy<Value = Option<Operand>> {
    prop_oneof![
        Just(None),
        ".{0,12}".prop_map(|s| Some(Operand::Text(s))),
        any::<f64>().prop_map(|n| Some(Operand::Number(n))),
        any::<bool>().prop_map(|b| Some(Operand::Bool(b))),
        prop::collection::vec(".{0,4}", 0..4)
            .prop_map(|items| Some(Operand::from(items))),
    ]
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Resolution terminates on any cover graph and lands inside the grid.
    #[test]
    fn resolver_is_bounded(rows in rows_strategy()) {
        for (r, row) in rows.iter().enumerate() {
            for c in 0..row.cells.len() {
                if let Some(resolved) = resolve_covered(&rows, CellPos::new(r, c)) {
                    prop_assert!(resolved.hops <= MAX_COVER_HOPS);
                    prop_assert!(resolved.pos.row < rows.len());
                    prop_assert!(resolved.pos.col < rows[resolved.pos.row].cells.len());
                    if resolved.hops < MAX_COVER_HOPS {
                        prop_assert!(!resolved.cell.is_covered());
                    }
                }
            }
        }
    }

    /// Inferred depth never exceeds the table, and never drops below the
    /// trusted persisted count.
    #[test]
    fn header_depth_is_bounded(rows in rows_strategy(), persisted in prop::option::of(0usize..9)) {
        let depth = infer_header_row_count(&rows, persisted, &mut TextCache::new());
        prop_assert!(depth <= rows.len());
        prop_assert!(depth >= persisted.unwrap_or(0).min(rows.len()));
    }

    /// Building the catalog twice gives the same entries, and every column
    /// keeps its stable fallback key.
    #[test]
    fn catalog_is_idempotent(rows in rows_strategy(), header in 0usize..5) {
        let mut cache = TextCache::new();
        let first = build_catalog(&rows, header, &mut cache);
        let second = build_catalog(&rows, header, &mut cache);
        prop_assert_eq!(&first, &second);

        let catalog = ColumnCatalog::build(&rows, header, &mut cache);
        for col in 0..catalog.column_count() {
            let entry = catalog.lookup_key(&format!("col:{}", col));
            prop_assert_eq!(entry.map(|e| e.top_col_index), Some(col));
            prop_assert_eq!(entry.map(|e| e.kind), Some(ColumnKind::Top));
        }
    }

    /// Rows above the header depth never receive a patch.
    #[test]
    fn header_rows_are_excluded(rows in rows_strategy(), header in 1usize..5) {
        let rule_sets: Vec<ColumnRuleSet> = (0..6)
            .map(|c| {
                ColumnRuleSet::for_column(c)
                    .with_rule(ConditionRule::unary(RuleOp::IsEmpty).with_then(ThenPatch::new().cell_class("e")))
                    .with_rule(ConditionRule::unary(RuleOp::IsNotEmpty).with_then(ThenPatch::new().cell_class("n")))
            })
            .collect();
        let mut cache = TextCache::new();

        for (r, row) in rows.iter().enumerate().take(header) {
            for (c, cell) in row.cells.iter().enumerate() {
                let patch = conditional_then_for_cell(
                    CellPos::new(r, c), None, cell, &rule_sets, &rows, header, &mut cache,
                );
                prop_assert_eq!(patch, None);
            }
        }
    }

    /// Rule evaluation never panics on arbitrary operands.
    #[test]
    fn rule_match_is_total(
        op in op_strategy(),
        value in operand_strategy(),
        value2 in operand_strategy(),
        ignore_case in prop::option::of(any::<bool>()),
        text in ".{0,16}",
    ) {
        let rule = ConditionRule {
            when: RuleCondition { op: Some(op), value, value2, ignore_case },
            ..ConditionRule::default()
        };
        let _ = evaluate_rule_match(&rule, &ComparableValue::from_text(text));
    }

    /// Disabled rules never match.
    #[test]
    fn disabled_rules_never_match(op in op_strategy(), text in text_strategy()) {
        let rule = ConditionRule::new(op, text.clone()).with_enabled(false);
        prop_assert!(!evaluate_rule_match(&rule, &ComparableValue::from_text(text)));
    }

    /// The grid service agrees with the free functions.
    #[test]
    fn grid_matches_free_functions(rows in rows_strategy(), persisted in prop::option::of(0usize..4)) {
        let mut table = Table::new(rows.clone());
        table.header_row_count = persisted;
        let mut grid = TableGrid::new(table);

        let mut cache = TextCache::new();
        let depth = infer_header_row_count(&rows, persisted, &mut cache);
        prop_assert_eq!(grid.header_row_count(), depth);
        prop_assert_eq!(grid.column_entries().to_vec(), build_catalog(&rows, depth, &mut cache));
    }
}
