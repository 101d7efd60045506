//! Conditional formatting
//!
//! Rules are grouped into column rule sets. Each rule set targets one
//! top-level column, or one leaf sub-column of a split header, and holds
//! rules evaluated in ascending priority against the cell's
//! [`ComparableValue`](crate::value::ComparableValue).
//!
//! ## Example
//!
//! ```rust
//! use slate_table_core::{ColumnRuleSet, ConditionRule, RuleOp, StylePatch, ThenPatch};
//!
//! let rules = ColumnRuleSet::for_column(2).with_rule(
//!     ConditionRule::new(RuleOp::GreaterThan, 100)
//!         .with_then(ThenPatch::with_style(StylePatch::new().background_color("#ffc7ce")))
//!         .with_priority(1),
//! );
//! assert_eq!(rules.rules.len(), 1);
//! ```

mod eval;
mod target;

pub use eval::{conditional_then_for_cell, evaluate_rule_match, evaluate_rule_set, RuleEngine};
pub use target::resolve_target;

use serde::{Deserialize, Deserializer, Serialize};

use crate::style::ThenPatch;
use crate::value::{parse_date, parse_number};

/// Comparison operator of a rule condition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleOp {
    /// Text is empty
    IsEmpty,
    /// Text is not empty
    IsNotEmpty,
    /// Text equals the operand
    Equals,
    /// Text differs from the operand
    NotEquals,
    /// Text equals the operand, always case-insensitive
    EqualsIgnoreCase,
    /// Text contains the operand
    Contains,
    /// Text does not contain the operand
    NotContains,
    /// Text starts with the operand
    StartsWith,
    /// Text ends with the operand
    EndsWith,
    /// Text is one of the listed values
    InList,
    /// Text is none of the listed values
    NotInList,
    /// Number is greater than the operand
    GreaterThan,
    /// Number is greater than or equal to the operand
    GreaterThanOrEqual,
    /// Number is less than the operand
    LessThan,
    /// Number is less than or equal to the operand
    LessThanOrEqual,
    /// Number is within both operands (inclusive)
    Between,
    /// Number is outside both operands
    NotBetween,
    /// Date is before the operand
    Before,
    /// Date is after the operand
    After,
    /// Date falls on the operand's calendar day
    On,
    /// Date falls within both operands' calendar days (inclusive)
    BetweenDates,
    /// An operator this version does not know; never matches
    Unsupported(String),
}

impl RuleOp {
    /// Persisted operator name
    pub fn as_str(&self) -> &str {
        match self {
            RuleOp::IsEmpty => "isEmpty",
            RuleOp::IsNotEmpty => "isNotEmpty",
            RuleOp::Equals => "equals",
            RuleOp::NotEquals => "notEquals",
            RuleOp::EqualsIgnoreCase => "equalsIgnoreCase",
            RuleOp::Contains => "contains",
            RuleOp::NotContains => "notContains",
            RuleOp::StartsWith => "startsWith",
            RuleOp::EndsWith => "endsWith",
            RuleOp::InList => "inList",
            RuleOp::NotInList => "notInList",
            RuleOp::GreaterThan => "greaterThan",
            RuleOp::GreaterThanOrEqual => "greaterThanOrEqual",
            RuleOp::LessThan => "lessThan",
            RuleOp::LessThanOrEqual => "lessThanOrEqual",
            RuleOp::Between => "between",
            RuleOp::NotBetween => "notBetween",
            RuleOp::Before => "before",
            RuleOp::After => "after",
            RuleOp::On => "on",
            RuleOp::BetweenDates => "betweenDates",
            RuleOp::Unsupported(name) => name,
        }
    }

    /// Parse a persisted operator name; unknown names become [`RuleOp::Unsupported`]
    pub fn from_name(name: &str) -> Self {
        match name {
            "isEmpty" => RuleOp::IsEmpty,
            "isNotEmpty" => RuleOp::IsNotEmpty,
            "equals" => RuleOp::Equals,
            "notEquals" => RuleOp::NotEquals,
            "equalsIgnoreCase" => RuleOp::EqualsIgnoreCase,
            "contains" => RuleOp::Contains,
            "notContains" => RuleOp::NotContains,
            "startsWith" => RuleOp::StartsWith,
            "endsWith" => RuleOp::EndsWith,
            "inList" => RuleOp::InList,
            "notInList" => RuleOp::NotInList,
            "greaterThan" => RuleOp::GreaterThan,
            "greaterThanOrEqual" => RuleOp::GreaterThanOrEqual,
            "lessThan" => RuleOp::LessThan,
            "lessThanOrEqual" => RuleOp::LessThanOrEqual,
            "between" => RuleOp::Between,
            "notBetween" => RuleOp::NotBetween,
            "before" => RuleOp::Before,
            "after" => RuleOp::After,
            "on" => RuleOp::On,
            "betweenDates" => RuleOp::BetweenDates,
            other => RuleOp::Unsupported(other.to_string()),
        }
    }

    /// Check if the operator needs a second operand
    pub fn is_ranged(&self) -> bool {
        matches!(
            self,
            RuleOp::Between | RuleOp::NotBetween | RuleOp::BetweenDates
        )
    }
}

impl From<String> for RuleOp {
    fn from(name: String) -> Self {
        RuleOp::from_name(&name)
    }
}

impl From<RuleOp> for String {
    fn from(op: RuleOp) -> Self {
        op.as_str().to_string()
    }
}

/// A rule operand as persisted by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    /// Boolean
    Bool(bool),
    /// Number
    Number(f64),
    /// Text
    Text(String),
    /// Explicit list (for `inList` / `notInList`)
    List(Vec<Operand>),
}

impl Operand {
    /// Text form of the operand
    pub fn to_text(&self) -> String {
        match self {
            Operand::Bool(b) => b.to_string(),
            Operand::Number(n) => format_number(*n),
            Operand::Text(s) => s.clone(),
            Operand::List(items) => items
                .iter()
                .map(Operand::to_text)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Numeric reading of the operand
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Operand::Number(n) => n.is_finite().then_some(*n),
            Operand::Text(s) => parse_number(s),
            Operand::Bool(_) | Operand::List(_) => None,
        }
    }

    /// Date reading of the operand, epoch milliseconds
    ///
    /// Numbers are taken as epoch milliseconds.
    pub fn to_date_ms(&self) -> Option<i64> {
        match self {
            Operand::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            Operand::Text(s) => parse_date(s),
            _ => None,
        }
    }

    /// Trimmed, non-empty list items; text operands are split on commas
    pub fn list_items(&self) -> Vec<String> {
        let items: Vec<String> = match self {
            Operand::List(items) => items.iter().map(Operand::to_text).collect(),
            Operand::Text(s) => s.split(',').map(str::to_string).collect(),
            other => vec![other.to_text()],
        };
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Text(s.to_string())
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::Text(s)
    }
}

impl From<f64> for Operand {
    fn from(n: f64) -> Self {
        Operand::Number(n)
    }
}

impl From<i32> for Operand {
    fn from(n: i32) -> Self {
        Operand::Number(n as f64)
    }
}

impl From<bool> for Operand {
    fn from(b: bool) -> Self {
        Operand::Bool(b)
    }
}

impl<T: Into<Operand>> From<Vec<T>> for Operand {
    fn from(items: Vec<T>) -> Self {
        Operand::List(items.into_iter().map(Into::into).collect())
    }
}

/// The `when` of a rule
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleCondition {
    /// Operator; a rule without one never matches
    pub op: Option<RuleOp>,
    /// First operand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Operand>,
    /// Second operand of ranged operators
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value2: Option<Operand>,
    /// Case-insensitive text comparison (defaults to `true`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_case: Option<bool>,
}

impl RuleCondition {
    /// Whether text comparisons ignore case
    pub fn ignores_case(&self) -> bool {
        self.ignore_case.unwrap_or(true)
    }
}

/// A single conditional rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConditionRule {
    /// Host-assigned identifier
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Condition
    pub when: RuleCondition,
    /// Patch applied when the condition matches
    pub then: ThenPatch,
    /// Priority (lower evaluates first)
    #[serde(deserialize_with = "lenient_priority")]
    pub priority: i32,
    /// Stop evaluating the rule set after this rule matches
    pub stop_if_true: bool,
    /// Disabled rules never match
    pub enabled: bool,
}

impl Default for ConditionRule {
    fn default() -> Self {
        Self {
            id: String::new(),
            when: RuleCondition::default(),
            then: ThenPatch::default(),
            priority: 0,
            stop_if_true: false,
            enabled: true,
        }
    }
}

impl ConditionRule {
    /// Create a rule comparing against one operand
    pub fn new(op: RuleOp, value: impl Into<Operand>) -> Self {
        Self {
            when: RuleCondition {
                op: Some(op),
                value: Some(value.into()),
                ..RuleCondition::default()
            },
            ..Self::default()
        }
    }

    /// Create a rule for an operator without operands (`isEmpty`, `isNotEmpty`)
    pub fn unary(op: RuleOp) -> Self {
        Self {
            when: RuleCondition {
                op: Some(op),
                ..RuleCondition::default()
            },
            ..Self::default()
        }
    }

    /// Create a ranged rule (`between`, `notBetween`, `betweenDates`)
    pub fn ranged(op: RuleOp, low: impl Into<Operand>, high: impl Into<Operand>) -> Self {
        Self {
            when: RuleCondition {
                op: Some(op),
                value: Some(low.into()),
                value2: Some(high.into()),
                ..RuleCondition::default()
            },
            ..Self::default()
        }
    }

    /// Set the identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the patch applied on match
    pub fn with_then(mut self, then: ThenPatch) -> Self {
        self.then = then;
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set stop-if-true
    pub fn with_stop_if_true(mut self, stop: bool) -> Self {
        self.stop_if_true = stop;
        self
    }

    /// Set case sensitivity of text comparisons
    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.when.ignore_case = Some(ignore_case);
        self
    }

    /// Enable or disable the rule
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Rules bound to one column or leaf column
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnRuleSet {
    /// Column key: `col:N`, `leaf:N:a.b`, or a catalog name key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_key: Option<String>,
    /// Human column name, looked up through the catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    /// Top-level column index
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_index"
    )]
    pub col_index: Option<usize>,
    /// Column index preferred over `col_index` when both are present
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_index"
    )]
    pub fallback_col_index: Option<usize>,
    /// Leaf path inside a split header column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf_col_path: Option<Vec<usize>>,
    /// Rules, in persisted order
    pub rules: Vec<ConditionRule>,
}

impl ColumnRuleSet {
    /// Create a rule set targeting a top-level column
    pub fn for_column(col: usize) -> Self {
        Self {
            col_index: Some(col),
            ..Self::default()
        }
    }

    /// Create a rule set targeting a column by key or name
    pub fn for_key(key: impl Into<String>) -> Self {
        Self {
            column_key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Restrict the rule set to one leaf sub-column
    pub fn with_leaf_path(mut self, path: Vec<usize>) -> Self {
        self.leaf_col_path = Some(path);
        self
    }

    /// Append a rule
    pub fn with_rule(mut self, rule: ConditionRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Decode a list of rule sets from the host's JSON
    pub fn list_from_json(json: &str) -> crate::Result<Vec<ColumnRuleSet>> {
        Ok(serde_json::from_str(json)?)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Non-negative whole numbers only; anything else (`-1`, `null`, `"2"`) is absent
fn lenient_index<'de, D>(deserializer: D) -> std::result::Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let n = serde_json::Value::deserialize(deserializer)?.as_f64();
    Ok(n.filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0)
        .map(|n| n as usize))
}

fn lenient_priority<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = serde_json::Value::deserialize(deserializer)?.as_f64();
    Ok(n.filter(|n| n.is_finite())
        .map(|n| n.clamp(i32::MIN as f64, i32::MAX as f64) as i32)
        .unwrap_or(0))
}
