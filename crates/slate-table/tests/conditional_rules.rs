//! Conditional rule resolution through the grid service

use pretty_assertions::assert_eq;
use slate_table::prelude::*;
use slate_table::{conditional_then_for_cell, TextCache};

fn background(color: &str) -> ThenPatch {
    ThenPatch::with_style(StylePatch::new().background_color(color))
}

/// Column 1 has a `Min / Max` split header; body row 1 splits that column
/// the same way, body row 2 leaves it whole.
fn range_table() -> Table {
    Table::new(vec![
        Row::new(vec![
            Cell::new("Sensor"),
            Cell::split(SplitGrid::from_texts(1, 2, &["Min", "Max"])),
        ]),
        Row::new(vec![
            Cell::new("t1"),
            Cell::split(SplitGrid::from_texts(1, 2, &["3", "41"])),
        ]),
        Row::from_texts(&["t2", "n/a"]),
    ])
    .with_header_row_count(1)
}

#[test]
fn test_leaf_rule_set_beats_whole_column() {
    let mut grid = TableGrid::new(range_table());
    grid.set_rule_sets(vec![
        ColumnRuleSet::for_column(1)
            .with_rule(ConditionRule::unary(RuleOp::IsNotEmpty).with_then(background("red"))),
        ColumnRuleSet::for_column(1)
            .with_leaf_path(vec![1])
            .with_rule(ConditionRule::unary(RuleOp::IsNotEmpty).with_then(background("blue"))),
    ]);

    let leaf = grid.cell_style(CellPos::new(1, 1), Some(&[1][..])).unwrap();
    assert_eq!(leaf.background_color.as_deref(), Some("blue"));

    let sibling = grid.cell_style(CellPos::new(1, 1), Some(&[0][..])).unwrap();
    assert_eq!(sibling.background_color.as_deref(), Some("red"));

    let whole = grid.cell_style(CellPos::new(2, 1), None).unwrap();
    assert_eq!(whole.background_color.as_deref(), Some("red"));
}

#[test]
fn test_leaf_order_does_not_depend_on_rule_set_order() {
    let mut grid = TableGrid::new(range_table());
    grid.set_rule_sets(vec![
        ColumnRuleSet::for_key("Max")
            .with_rule(ConditionRule::unary(RuleOp::IsNotEmpty).with_then(background("blue"))),
        ColumnRuleSet::for_key("col:1")
            .with_rule(ConditionRule::unary(RuleOp::IsNotEmpty).with_then(background("red"))),
    ]);

    let leaf = grid.cell_style(CellPos::new(1, 1), Some(&[1][..])).unwrap();
    assert_eq!(leaf.background_color.as_deref(), Some("blue"));
}

#[test]
fn test_stop_if_true_keeps_first_class() {
    let mut grid = TableGrid::new(range_table());
    grid.set_rule_sets(vec![ColumnRuleSet::for_column(0)
        .with_rule(
            ConditionRule::unary(RuleOp::IsNotEmpty)
                .with_priority(2)
                .with_then(ThenPatch::new().cell_class("b")),
        )
        .with_rule(
            ConditionRule::unary(RuleOp::IsNotEmpty)
                .with_priority(1)
                .with_stop_if_true(true)
                .with_then(ThenPatch::new().cell_class("a")),
        )]);

    assert_eq!(grid.cell_class(CellPos::new(2, 0), None).as_deref(), Some("a"));
}

#[test]
fn test_header_rows_are_excluded() {
    let table = range_table();
    let rule_sets = vec![ColumnRuleSet::for_column(0)
        .with_rule(ConditionRule::unary(RuleOp::IsNotEmpty).with_then(background("red")))];
    let mut cache = TextCache::new();

    let header_cell = &table.rows[0].cells[0];
    for header_row_count in 1..=3 {
        let patch = conditional_then_for_cell(
            CellPos::new(0, 0),
            None,
            header_cell,
            &rule_sets,
            &table.rows,
            header_row_count,
            &mut cache,
        );
        assert_eq!(patch, None);
    }

    let body = conditional_then_for_cell(
        CellPos::new(2, 0),
        None,
        &table.rows[2].cells[0],
        &rule_sets,
        &table.rows,
        1,
        &mut cache,
    );
    assert_eq!(body, Some(background("red")));
}

#[test]
fn test_unresolvable_rule_set_is_inert() {
    let mut grid = TableGrid::new(range_table());
    grid.set_rule_sets(vec![
        ColumnRuleSet::for_key("Humidity")
            .with_rule(ConditionRule::unary(RuleOp::IsNotEmpty).with_then(background("red"))),
        ColumnRuleSet::for_column(7)
            .with_rule(ConditionRule::unary(RuleOp::IsNotEmpty).with_then(background("red"))),
    ]);

    assert!(grid.evaluate_all().is_empty());
}

#[test]
fn test_evaluate_all_visits_leaves() {
    let mut grid = TableGrid::new(range_table());
    grid.set_rule_sets(vec![ColumnRuleSet::for_column(1).with_rule(
        ConditionRule::new(RuleOp::GreaterThan, 40).with_then(ThenPatch::new().tooltip("hot")),
    )]);

    let decisions = grid.evaluate_all();
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].pos, CellPos::new(1, 1));
    assert_eq!(decisions[0].leaf_path, Some(vec![1]));
    assert_eq!(decisions[0].then.tooltip_text(), Some("hot"));
}

#[test]
fn test_rules_from_persisted_json() {
    let json = r#"[
        {
            "columnName": "sensor",
            "rules": [
                { "id": "r1", "when": { "op": "inList", "value": "T1, t3" },
                  "then": { "fontWeight": "bold", "cellClass": "flag", "tooltip": "" }, "priority": 1 },
                { "id": "r2", "when": { "op": "equals", "value": "T1", "ignoreCase": false },
                  "then": { "fontWeight": "normal" }, "priority": 0 },
                { "id": "r3", "when": { "op": "unknownOp", "value": "t1" },
                  "then": { "cellClass": "never" } }
            ]
        },
        { "columnKey": "leaf:1:0", "rules": [
            { "when": { "op": "between", "value": 5, "value2": "1" }, "then": { "textColor": "green" } }
        ] }
    ]"#;

    let mut grid = TableGrid::new(range_table());
    grid.set_rule_sets_json(json).unwrap();

    let name = grid.conditional_then(CellPos::new(1, 0), None).unwrap();
    assert_eq!(name.style().font_weight.as_deref(), Some("bold"));
    assert_eq!(name.class_name(), Some("flag"));
    assert_eq!(name.tooltip_text(), None);

    let min = grid.cell_style(CellPos::new(1, 1), Some(&[0][..])).unwrap();
    assert_eq!(min.to_css(), "color: green");
    assert_eq!(grid.cell_style(CellPos::new(1, 1), Some(&[1][..])), None);
}

#[test]
fn test_date_rules() {
    let table = Table::new(vec![
        Row::from_texts(&["Due"]),
        Row::from_texts(&["2024-03-10"]),
        Row::from_texts(&["10 Mar 2024"]),
        Row::from_texts(&["2024-04-01T08:00:00Z"]),
        Row::from_texts(&["tbd"]),
    ])
    .with_header_row_count(1);

    let mut grid = TableGrid::new(table);
    grid.set_rule_sets(vec![ColumnRuleSet::for_key("due")
        .with_rule(
            ConditionRule::new(RuleOp::On, "2024-03-10T17:30:00Z")
                .with_then(ThenPatch::new().cell_class("today")),
        )
        .with_rule(
            ConditionRule::ranged(RuleOp::BetweenDates, "2024-04-30", "2024-04-01")
                .with_then(ThenPatch::new().cell_class("april")),
        )]);

    let classes: Vec<Option<String>> = (1..5)
        .map(|r| grid.cell_class(CellPos::new(r, 0), None))
        .collect();
    assert_eq!(
        classes,
        vec![
            Some("today".to_string()),
            Some("today".to_string()),
            Some("april".to_string()),
            None
        ]
    );
}
