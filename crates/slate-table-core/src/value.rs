//! Comparable cell values
//!
//! Cell content is rich-text markup. Rules and header inference work on the
//! plain text inside it, plus a numeric and a date reading of that text.
//! Extraction is memoized per markup string in a [`TextCache`] owned by one
//! grid instance; the cache never evicts and must be cleared by its owner.

use ahash::AHashMap;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_regex::{regex, regex_is_match};

use crate::cell::Cell;

const MS_PER_DAY: i64 = 86_400_000;

/// Naive date-time layouts accepted by [`parse_date`] (interpreted as UTC)
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts accepted by [`parse_date`] (midnight UTC)
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

/// Extract collapsed, trimmed plain text from cell markup
///
/// ```rust
/// use slate_table_core::value::markup_to_text;
///
/// assert_eq!(markup_to_text("<p>Net&nbsp;<b>sales</b></p><p>2024</p>"), "Net sales 2024");
/// ```
pub fn markup_to_text(markup: &str) -> String {
    if !markup.contains('<') && !markup.contains('&') {
        return collapse_whitespace(markup);
    }

    let spaced = regex!(r"(?i)<br\s*/?>|</(?:p|div|li|tr|td|th|h[1-6])\s*>").replace_all(markup, " ");
    let stripped = regex!(r"<[^>]*>").replace_all(&spaced, "");
    let decoded = regex!(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").replace_all(
        &stripped,
        |caps: &lazy_regex::Captures| {
            decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        },
    );

    collapse_whitespace(&decoded)
}

fn decode_entity(name: &str) -> Option<String> {
    let c = match name {
        "nbsp" => ' ',
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some(c.to_string())
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    regex!(r"\s+").replace_all(text.trim(), " ").into_owned()
}

/// Parse a number, ignoring currency symbols, `%` and thousands separators
///
/// Returns `None` for empty or non-finite results.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | '₹' | '%' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let n: f64 = cleaned.parse().ok()?;
    n.is_finite().then_some(n)
}

/// Parse a date or date-time into epoch milliseconds
///
/// Parsing is locale-independent; values without an offset are taken as UTC.
/// Text that reads as a plain number is never a date.
pub fn parse_date(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() || text.parse::<f64>().is_ok() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.timestamp_millis());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_millis());
        }
    }

    None
}

/// Calendar day (days since the epoch, UTC) of an epoch-millisecond value
pub fn day_of(ms: i64) -> i64 {
    ms.div_euclid(MS_PER_DAY)
}

/// Check if extracted text looks purely numeric (digits, `.`, `-`, `+`, `,`, spaces)
pub fn is_numeric_like(text: &str) -> bool {
    regex_is_match!(r"^[0-9.\-+, ]+$", text)
}

/// The parsed form of a cell's content used by the rule engine
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparableValue {
    /// Plain text
    pub text: String,
    /// Lowercased plain text
    pub text_lower: String,
    /// Numeric reading of the text
    pub num: Option<f64>,
    /// Date reading of the text, epoch milliseconds
    pub date_ms: Option<i64>,
}

static EMPTY_VALUE: ComparableValue = ComparableValue {
    text: String::new(),
    text_lower: String::new(),
    num: None,
    date_ms: None,
};

impl ComparableValue {
    /// Build from already-extracted plain text
    pub fn from_text<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        Self {
            text_lower: text.to_lowercase(),
            num: parse_number(&text),
            date_ms: parse_date(&text),
            text,
        }
    }

    /// Check if the text is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Markup → text cache owned by one grid instance
///
/// Keys are exact markup strings. There is no eviction: the owner calls
/// [`TextCache::clear`] when the table widget goes away.
#[derive(Debug, Default)]
pub struct TextCache {
    texts: AHashMap<String, String>,
    values: AHashMap<String, ComparableValue>,
}

impl TextCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain text of `markup`, memoized
    pub fn text(&mut self, markup: &str) -> &str {
        if !self.texts.contains_key(markup) {
            let text = markup_to_text(markup);
            self.texts.insert(markup.to_owned(), text);
        }
        &self.texts[markup]
    }

    /// Comparable value of `markup`, memoized
    pub fn comparable(&mut self, markup: &str) -> &ComparableValue {
        if !self.values.contains_key(markup) {
            let value = ComparableValue::from_text(self.text(markup));
            self.values.insert(markup.to_owned(), value);
        }
        &self.values[markup]
    }

    /// Comparable value of a cell; a split cell's own content is ignored
    pub fn comparable_for_cell(&mut self, cell: &Cell) -> &ComparableValue {
        if cell.is_split() {
            return &EMPTY_VALUE;
        }
        self.comparable(&cell.content)
    }

    /// Plain text of a cell; empty for split cells
    pub fn cell_text(&mut self, cell: &Cell) -> &str {
        if cell.is_split() {
            return "";
        }
        self.text(&cell.content)
    }

    /// Number of cached markup strings
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Drop every cached entry
    pub fn clear(&mut self) {
        tracing::debug!("clearing text cache ({} entries)", self.texts.len());
        self.texts.clear();
        self.values.clear();
    }
}
