use crate::catalog::{ColumnCatalog, ColumnTarget};
use crate::cell::{Cell, CellPos, Row};
use crate::style::ThenPatch;
use crate::value::{day_of, ComparableValue, TextCache};

use super::{resolve_target, ColumnRuleSet, ConditionRule, Operand, RuleOp};

/// Check if a rule matches a cell value
///
/// Disabled rules, rules without an operator, unknown operators and
/// operands that fail to parse never match.
pub fn evaluate_rule_match(rule: &ConditionRule, value: &ComparableValue) -> bool {
    if !rule.enabled {
        return false;
    }
    let Some(op) = &rule.when.op else {
        return false;
    };

    let when = &rule.when;
    let ignore_case = when.ignores_case();
    let first = when.value.as_ref();
    let second = when.value2.as_ref();

    match op {
        RuleOp::IsEmpty => value.is_empty(),
        RuleOp::IsNotEmpty => !value.is_empty(),

        RuleOp::Equals => compare_text(value, first, ignore_case, |t, o| t == o),
        RuleOp::NotEquals => compare_text(value, first, ignore_case, |t, o| t != o),
        RuleOp::EqualsIgnoreCase => compare_text(value, first, true, |t, o| t == o),
        RuleOp::Contains => compare_text(value, first, ignore_case, |t, o| t.contains(o)),
        RuleOp::NotContains => compare_text(value, first, ignore_case, |t, o| !t.contains(o)),
        RuleOp::StartsWith => compare_text(value, first, ignore_case, |t, o| t.starts_with(o)),
        RuleOp::EndsWith => compare_text(value, first, ignore_case, |t, o| t.ends_with(o)),

        RuleOp::InList => in_list(value, first, ignore_case).unwrap_or(false),
        RuleOp::NotInList => in_list(value, first, ignore_case).is_some_and(|found| !found),

        RuleOp::GreaterThan => compare_number(value, first, |n, x| n > x),
        RuleOp::GreaterThanOrEqual => compare_number(value, first, |n, x| n >= x),
        RuleOp::LessThan => compare_number(value, first, |n, x| n < x),
        RuleOp::LessThanOrEqual => compare_number(value, first, |n, x| n <= x),
        RuleOp::Between => number_in_range(value, first, second).unwrap_or(false),
        RuleOp::NotBetween => number_in_range(value, first, second).is_some_and(|inside| !inside),

        RuleOp::Before => compare_date(value, first, |d, x| d < x),
        RuleOp::After => compare_date(value, first, |d, x| d > x),
        RuleOp::On => compare_date(value, first, |d, x| day_of(d) == day_of(x)),
        RuleOp::BetweenDates => date_in_range(value, first, second),

        RuleOp::Unsupported(_) => false,
    }
}

fn compare_text<F>(value: &ComparableValue, operand: Option<&Operand>, ignore_case: bool, f: F) -> bool
where
    F: Fn(&str, &str) -> bool,
{
    let Some(operand) = operand else {
        return false;
    };
    let operand = operand.to_text();
    if ignore_case {
        f(&value.text_lower, &operand.to_lowercase())
    } else {
        f(&value.text, &operand)
    }
}

/// `None` when there is no operand to test against
fn in_list(value: &ComparableValue, operand: Option<&Operand>, ignore_case: bool) -> Option<bool> {
    let items = operand?.list_items();
    let found = if ignore_case {
        items.iter().any(|i| i.to_lowercase() == value.text_lower)
    } else {
        items.iter().any(|i| *i == value.text)
    };
    Some(found)
}

fn compare_number<F>(value: &ComparableValue, operand: Option<&Operand>, f: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    match (value.num, operand.and_then(Operand::to_number)) {
        (Some(n), Some(x)) => f(n, x),
        _ => false,
    }
}

/// `None` unless the value and both bounds parse; bounds may come in either order
fn number_in_range(
    value: &ComparableValue,
    low: Option<&Operand>,
    high: Option<&Operand>,
) -> Option<bool> {
    let n = value.num?;
    let a = low?.to_number()?;
    let b = high?.to_number()?;
    Some(a.min(b) <= n && n <= a.max(b))
}

fn compare_date<F>(value: &ComparableValue, operand: Option<&Operand>, f: F) -> bool
where
    F: Fn(i64, i64) -> bool,
{
    match (value.date_ms, operand.and_then(Operand::to_date_ms)) {
        (Some(d), Some(x)) => f(d, x),
        _ => false,
    }
}

fn date_in_range(value: &ComparableValue, low: Option<&Operand>, high: Option<&Operand>) -> bool {
    let (Some(d), Some(a), Some(b)) = (
        value.date_ms,
        low.and_then(Operand::to_date_ms),
        high.and_then(Operand::to_date_ms),
    ) else {
        return false;
    };
    let day = day_of(d);
    day_of(a.min(b)) <= day && day <= day_of(a.max(b))
}

/// Evaluate one rule set against a value
///
/// Rules run in ascending priority (ties keep persisted order). Each match
/// is merged with [`ThenPatch::merge_rule`]; a matching `stopIfTrue` rule
/// ends the rule set.
pub fn evaluate_rule_set(rule_set: &ColumnRuleSet, value: &ComparableValue) -> ThenPatch {
    let mut rules: Vec<&ConditionRule> = rule_set.rules.iter().collect();
    rules.sort_by_key(|r| r.priority);

    let mut patch = ThenPatch::default();
    for rule in rules {
        if !evaluate_rule_match(rule, value) {
            continue;
        }
        patch.merge_rule(&rule.then);
        if rule.stop_if_true {
            break;
        }
    }
    patch
}

/// Rule sets with their targets resolved against one column catalog
///
/// Build once per table snapshot and rule-set list, then query per cell.
#[derive(Debug, Clone)]
pub struct RuleEngine<'a> {
    whole: Vec<(usize, &'a ColumnRuleSet)>,
    leaf: Vec<(ColumnTarget, &'a ColumnRuleSet)>,
}

impl<'a> RuleEngine<'a> {
    /// Resolve the targets of `rule_sets`; unresolvable rule sets are dropped
    pub fn new(rule_sets: &'a [ColumnRuleSet], catalog: &ColumnCatalog) -> Self {
        let mut whole = Vec::new();
        let mut leaf = Vec::new();
        for rule_set in rule_sets {
            match resolve_target(rule_set, catalog) {
                Some(target) if target.is_leaf() => leaf.push((target, rule_set)),
                Some(target) => whole.push((target.col, rule_set)),
                None => {}
            }
        }
        Self { whole, leaf }
    }

    /// Number of rule sets with a resolved target
    pub fn len(&self) -> usize {
        self.whole.len() + self.leaf.len()
    }

    /// Check if no rule set resolved
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merged patch for the cell rendered at `pos`
    ///
    /// `leaf_path` identifies the leaf sub-column the cell renders under, if
    /// any; `cell` is the rendered cell itself (the sub-cell for a leaf).
    /// Whole-column rule sets are folded first, then leaf-specific ones.
    /// Header rows and cells where no field ends up set yield `None`.
    pub fn then_for_cell(
        &self,
        pos: CellPos,
        leaf_path: Option<&[usize]>,
        cell: &Cell,
        header_row_count: usize,
        cache: &mut TextCache,
    ) -> Option<ThenPatch> {
        if pos.row < header_row_count {
            return None;
        }

        let value = cache.comparable_for_cell(cell);
        let mut acc = ThenPatch::default();

        for (_, rule_set) in self.whole.iter().filter(|(col, _)| *col == pos.col) {
            acc.overlay(&evaluate_rule_set(rule_set, value));
        }
        for (_, rule_set) in self
            .leaf
            .iter()
            .filter(|(t, _)| t.col == pos.col && t.leaf_path.as_deref() == leaf_path)
        {
            acc.overlay(&evaluate_rule_set(rule_set, value));
        }

        (!acc.is_empty()).then_some(acc)
    }
}

/// Merged conditional patch for one cell, resolving targets from scratch
///
/// Hosts evaluating many cells should build a [`RuleEngine`] once instead.
pub fn conditional_then_for_cell(
    pos: CellPos,
    leaf_path: Option<&[usize]>,
    cell: &Cell,
    rule_sets: &[ColumnRuleSet],
    rows: &[Row],
    header_row_count: usize,
    cache: &mut TextCache,
) -> Option<ThenPatch> {
    if pos.row < header_row_count || rule_sets.is_empty() {
        return None;
    }
    let catalog = ColumnCatalog::build(rows, header_row_count, cache);
    RuleEngine::new(rule_sets, &catalog).then_for_cell(pos, leaf_path, cell, header_row_count, cache)
}
