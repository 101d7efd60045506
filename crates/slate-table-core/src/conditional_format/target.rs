use crate::catalog::{ColumnCatalog, ColumnEntry, ColumnTarget};

use super::ColumnRuleSet;

/// Resolve the column a rule set applies to
///
/// Resolution order:
/// 1. `columnKey` parsed as `col:N` or `leaf:N:a.b`
/// 2. `fallbackColIndex`, then `colIndex`
/// 3. catalog lookup of `columnKey`, then of `columnName`
///
/// An explicit `leafColPath` narrows a whole-column target to that leaf.
/// Returns `None` (the rule set is inert) when nothing resolves or the
/// column is outside the table.
pub fn resolve_target(rule_set: &ColumnRuleSet, catalog: &ColumnCatalog) -> Option<ColumnTarget> {
    let key = rule_set.column_key.as_deref().filter(|k| !k.trim().is_empty());

    let resolved = key
        .and_then(|k| ColumnTarget::parse_key(k.trim()).ok())
        .or_else(|| {
            rule_set
                .fallback_col_index
                .or(rule_set.col_index)
                .map(ColumnTarget::top)
        })
        .or_else(|| key.and_then(|k| catalog.lookup_key(k)).map(ColumnEntry::target))
        .or_else(|| {
            rule_set
                .column_name
                .as_deref()
                .and_then(|n| catalog.lookup_name(n))
                .map(ColumnEntry::target)
        });

    let Some(mut target) = resolved else {
        tracing::debug!(
            "rule set {:?} / {:?} matches no column, ignoring",
            rule_set.column_key,
            rule_set.column_name
        );
        return None;
    };

    if target.leaf_path.is_none() {
        target.leaf_path = rule_set.leaf_col_path.clone();
    }
    if target.leaf_path.as_ref().is_some_and(|p| p.is_empty()) {
        target.leaf_path = None;
    }

    if target.col >= catalog.column_count() {
        tracing::debug!(
            "rule set target {} is outside {} columns, ignoring",
            target,
            catalog.column_count()
        );
        return None;
    }
    Some(target)
}
