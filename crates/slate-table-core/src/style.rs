//! Style patches produced by conditional rules
//!
//! A rule's `then` is a sparse patch: only the fields it sets are applied to
//! the rendered cell. Fields holding an empty string count as unset, so a
//! later patch can never clear a value with `""`.

use serde::{Deserialize, Serialize};

/// CSS-level style overrides for one cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StylePatch {
    /// Background color (any CSS color)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Text color
    #[serde(skip_serializing_if = "Option::is_none", alias = "textColor")]
    pub color: Option<String>,
    /// Font weight (`bold`, `600`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    /// Font style (`italic`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    /// Text decoration (`underline`, `line-through`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_decoration: Option<String>,
}

impl StylePatch {
    /// Create an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Set background color
    pub fn background_color<S: Into<String>>(mut self, color: S) -> Self {
        self.background_color = Some(color.into());
        self
    }

    /// Set text color
    pub fn color<S: Into<String>>(mut self, color: S) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set font weight
    pub fn font_weight<S: Into<String>>(mut self, weight: S) -> Self {
        self.font_weight = Some(weight.into());
        self
    }

    /// Set font style
    pub fn font_style<S: Into<String>>(mut self, style: S) -> Self {
        self.font_style = Some(style.into());
        self
    }

    /// Set text decoration
    pub fn text_decoration<S: Into<String>>(mut self, decoration: S) -> Self {
        self.text_decoration = Some(decoration.into());
        self
    }

    /// Check if no field is set to a non-empty value
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.is_none())
    }

    /// Overlay `other`: each non-empty field of `other` replaces ours
    pub fn overlay(&mut self, other: &StylePatch) {
        overlay_field(&mut self.background_color, &other.background_color);
        overlay_field(&mut self.color, &other.color);
        overlay_field(&mut self.font_weight, &other.font_weight);
        overlay_field(&mut self.font_style, &other.font_style);
        overlay_field(&mut self.text_decoration, &other.text_decoration);
    }

    /// Render as an inline CSS declaration list
    ///
    /// ```rust
    /// use slate_table_core::StylePatch;
    ///
    /// let css = StylePatch::new().background_color("#fee").font_weight("bold").to_css();
    /// assert_eq!(css, "background-color: #fee; font-weight: bold");
    /// ```
    pub fn to_css(&self) -> String {
        self.fields()
            .iter()
            .filter_map(|(prop, v)| v.map(|v| format!("{}: {}", prop, v)))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn fields(&self) -> [(&'static str, Option<&str>); 5] {
        [
            ("background-color", non_empty(&self.background_color)),
            ("color", non_empty(&self.color)),
            ("font-weight", non_empty(&self.font_weight)),
            ("font-style", non_empty(&self.font_style)),
            ("text-decoration", non_empty(&self.text_decoration)),
        ]
    }
}

/// The `then` of a conditional rule, and the merged result for a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThenPatch {
    /// Style overrides
    #[serde(flatten)]
    pub style: StylePatch,
    /// CSS class added to the cell
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_class: Option<String>,
    /// Tooltip text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl ThenPatch {
    /// Create an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a patch holding only style overrides
    pub fn with_style(style: StylePatch) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    /// Set the CSS class
    pub fn cell_class<S: Into<String>>(mut self, class: S) -> Self {
        self.cell_class = Some(class.into());
        self
    }

    /// Set the tooltip
    pub fn tooltip<S: Into<String>>(mut self, tooltip: S) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    /// Style overrides
    pub fn style(&self) -> &StylePatch {
        &self.style
    }

    /// The CSS class, if set to a non-empty value
    pub fn class_name(&self) -> Option<&str> {
        non_empty(&self.cell_class)
    }

    /// The tooltip, if set to a non-empty value
    pub fn tooltip_text(&self) -> Option<&str> {
        non_empty(&self.tooltip)
    }

    /// Check if no field is set to a non-empty value
    pub fn is_empty(&self) -> bool {
        self.style.is_empty() && self.class_name().is_none() && self.tooltip_text().is_none()
    }

    /// Merge the `then` of a later-matching rule within one rule set
    ///
    /// Style fields take the later non-empty value; the class and tooltip
    /// keep the first non-empty value.
    pub fn merge_rule(&mut self, then: &ThenPatch) {
        self.style.overlay(&then.style);
        keep_first(&mut self.cell_class, &then.cell_class);
        keep_first(&mut self.tooltip, &then.tooltip);
    }

    /// Overlay the merged patch of a later rule set; every non-empty field wins
    pub fn overlay(&mut self, other: &ThenPatch) {
        self.style.overlay(&other.style);
        overlay_field(&mut self.cell_class, &other.cell_class);
        overlay_field(&mut self.tooltip, &other.tooltip);
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn overlay_field(target: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = non_empty(value) {
        *target = Some(v.to_string());
    }
}

fn keep_first(target: &mut Option<String>, value: &Option<String>) {
    if non_empty(target).is_none() {
        overlay_field(target, value);
    }
}
