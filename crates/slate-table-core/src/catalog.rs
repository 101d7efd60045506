//! Column catalog
//!
//! Turns the header rows of a table into stable column identities: one
//! [`ColumnEntry`] per top-level column, plus one per leaf sub-column for
//! header cells split horizontally. Rule sets target columns through these
//! keys and names.
//!
//! ## Naming
//!
//! A header cell yields *layers*: one for plain text, or one per sub-row for
//! a split cell (sub-column labels joined with `" / "`). A column's name is
//! its layers joined with `" > "`. Once a split header cell yields more than
//! one layer, deeper top-level rows are not consulted for that column.
//!
//! Leaf columns come from descending through splits with more than one
//! sub-column; the sub-column indices taken form the leaf path. Purely
//! vertical splits add layers but no path component.
//!
//! ```rust
//! use slate_table_core::{Cell, ColumnCatalog, Row, SplitGrid, TextCache};
//!
//! let rows = vec![
//!     Row::new(vec![
//!         Cell::new("id"),
//!         Cell::split(SplitGrid::from_texts(2, 2, &["f", "s", "b", "r"])),
//!     ]),
//!     Row::from_texts(&["1", "x"]),
//! ];
//! let catalog = ColumnCatalog::build(&rows, 1, &mut TextCache::new());
//! let leaves: Vec<_> = catalog.leaves(1).map(|e| e.name.as_str()).collect();
//! assert_eq!(leaves, ["f > b", "s > r"]);
//! ```

use std::fmt;
use std::str::FromStr;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::cell::{resolve_covered, resolve_in_split, Cell, CellPos, Row, SplitGrid};
use crate::error::{Error, Result};
use crate::value::TextCache;

/// Maximum number of layers taken from one split header cell
pub const MAX_HEADER_LAYERS: usize = 4;

/// Maximum split nesting followed when naming or enumerating leaves
pub const MAX_SPLIT_DEPTH: usize = 4;

/// Separator between header layers in a column name
pub const LAYER_SEPARATOR: &str = " > ";

/// Separator between sub-column labels within one layer
pub const LABEL_SEPARATOR: &str = " / ";

/// Whether an entry is a top-level column or a split leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// A top-level table column
    Top,
    /// A rendered sub-column of a split header cell
    Leaf,
}

/// One pickable column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnEntry {
    /// Top-level or leaf
    pub kind: ColumnKind,
    /// Top-level column this entry belongs to
    pub top_col_index: usize,
    /// Sub-column indices for leaf entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_path: Option<Vec<usize>>,
    /// Header layers joined with `" > "`, possibly empty
    pub name: String,
    /// Lookup key
    pub key: String,
}

impl ColumnEntry {
    /// The column this entry identifies
    pub fn target(&self) -> ColumnTarget {
        ColumnTarget {
            col: self.top_col_index,
            leaf_path: self.leaf_path.clone(),
        }
    }

    /// Display label; unnamed columns fall back to their column letters
    pub fn label(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        let letters = CellPos::column_to_letters(self.top_col_index);
        match &self.leaf_path {
            Some(path) => format!("Column {} ({})", letters, join_path(path)),
            None => format!("Column {}", letters),
        }
    }
}

/// A resolved column identity: top-level column plus optional leaf path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnTarget {
    /// Top-level column index
    pub col: usize,
    /// Leaf path inside the column's split header, if leaf-specific
    pub leaf_path: Option<Vec<usize>>,
}

impl ColumnTarget {
    /// Whole top-level column
    pub fn top(col: usize) -> Self {
        Self {
            col,
            leaf_path: None,
        }
    }

    /// Leaf sub-column
    pub fn leaf(col: usize, path: Vec<usize>) -> Self {
        Self {
            col,
            leaf_path: Some(path),
        }
    }

    /// Check if this targets a leaf sub-column
    pub fn is_leaf(&self) -> bool {
        self.leaf_path.is_some()
    }

    /// Stable key: `col:N` or `leaf:N:a.b`
    pub fn key(&self) -> String {
        match &self.leaf_path {
            Some(path) => format!("leaf:{}:{}", self.col, join_path(path)),
            None => format!("col:{}", self.col),
        }
    }

    /// Parse a stable key
    ///
    /// ```rust
    /// use slate_table_core::ColumnTarget;
    ///
    /// assert_eq!(ColumnTarget::parse_key("col:3").unwrap(), ColumnTarget::top(3));
    /// assert_eq!(
    ///     ColumnTarget::parse_key("leaf:2:0.1").unwrap(),
    ///     ColumnTarget::leaf(2, vec![0, 1])
    /// );
    /// assert!(ColumnTarget::parse_key("region").is_err());
    /// ```
    pub fn parse_key(key: &str) -> Result<Self> {
        let invalid = || Error::InvalidColumnKey(key.to_string());
        let key_trimmed = key.trim();

        if let Some(col) = key_trimmed.strip_prefix("col:") {
            let col = col.trim().parse().map_err(|_| invalid())?;
            return Ok(Self::top(col));
        }

        let rest = key_trimmed.strip_prefix("leaf:").ok_or_else(invalid)?;
        let (col, path) = rest.split_once(':').ok_or_else(invalid)?;
        let col = col.trim().parse().map_err(|_| invalid())?;
        let path = path
            .split('.')
            .map(|p| p.trim().parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;

        Ok(Self::leaf(col, path))
    }
}

impl fmt::Display for ColumnTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for ColumnTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_key(s)
    }
}

/// Normalize a column name into a lookup key (trim, collapse whitespace, lowercase)
pub fn normalize_key(name: &str) -> String {
    crate::value::collapse_whitespace(name).to_lowercase()
}

fn join_path(path: &[usize]) -> String {
    path.iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// The column identities of one table
#[derive(Debug, Clone, Default)]
pub struct ColumnCatalog {
    entries: Vec<ColumnEntry>,
    column_count: usize,
    keys: AHashMap<String, usize>,
}

impl ColumnCatalog {
    /// Build the catalog from the first `header_row_count` rows
    pub fn build(rows: &[Row], header_row_count: usize, cache: &mut TextCache) -> Self {
        let header_rows = header_row_count.min(rows.len());
        let column_count = rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
        let mut catalog = Self {
            entries: Vec::with_capacity(column_count),
            column_count,
            keys: AHashMap::new(),
        };

        for col in 0..column_count {
            let (chain, leaves) = column_layers(rows, header_rows, col, cache);
            catalog.push_top(col, chain.join(LAYER_SEPARATOR));
            for leaf in leaves {
                catalog.push_leaf(col, leaf);
            }
        }

        catalog
    }

    fn push_top(&mut self, col: usize, name: String) {
        let idx = self.entries.len();
        let fallback = ColumnTarget::top(col).key();
        let key = match normalize_key(&name) {
            k if k.is_empty() => fallback.clone(),
            k => k,
        };

        self.keys.entry(key.clone()).or_insert(idx);
        self.keys.insert(fallback, idx);
        self.entries.push(ColumnEntry {
            kind: ColumnKind::Top,
            top_col_index: col,
            leaf_path: None,
            name,
            key,
        });
    }

    fn push_leaf(&mut self, col: usize, leaf: LeafColumn) {
        let idx = self.entries.len();
        let name = leaf.chain.join(LAYER_SEPARATOR);
        let key = ColumnTarget::leaf(col, leaf.path.clone()).key();

        let name_key = normalize_key(&name);
        if !name_key.is_empty() {
            self.keys.entry(name_key).or_insert(idx);
        }
        self.keys.insert(key.clone(), idx);
        self.entries.push(ColumnEntry {
            kind: ColumnKind::Leaf,
            top_col_index: col,
            leaf_path: Some(leaf.path),
            name,
            key,
        });
    }

    /// All entries: each top-level column followed by its leaves
    pub fn entries(&self) -> &[ColumnEntry] {
        &self.entries
    }

    /// Consume the catalog, returning its entries
    pub fn into_entries(self) -> Vec<ColumnEntry> {
        self.entries
    }

    /// Number of top-level columns
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// The top-level entry of `col`
    pub fn top(&self, col: usize) -> Option<&ColumnEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == ColumnKind::Top && e.top_col_index == col)
    }

    /// The leaf entries of `col`
    pub fn leaves(&self, col: usize) -> impl Iterator<Item = &ColumnEntry> + '_ {
        self.entries
            .iter()
            .filter(move |e| e.kind == ColumnKind::Leaf && e.top_col_index == col)
    }

    /// Look up an entry by key; name keys are matched after normalization
    pub fn lookup_key(&self, key: &str) -> Option<&ColumnEntry> {
        self.keys
            .get(key)
            .or_else(|| self.keys.get(&normalize_key(key)))
            .map(|&idx| &self.entries[idx])
    }

    /// Look up an entry by human column name
    pub fn lookup_name(&self, name: &str) -> Option<&ColumnEntry> {
        let key = normalize_key(name);
        if key.is_empty() {
            return None;
        }
        self.keys.get(&key).map(|&idx| &self.entries[idx])
    }
}

/// Build the column entries of a table (see [`ColumnCatalog::build`])
pub fn build_catalog(
    rows: &[Row],
    header_row_count: usize,
    cache: &mut TextCache,
) -> Vec<ColumnEntry> {
    ColumnCatalog::build(rows, header_row_count, cache).into_entries()
}

#[derive(Debug)]
struct LeafColumn {
    path: Vec<usize>,
    chain: Vec<String>,
}

/// Walk the header rows of one column, returning its layer chain and leaves
fn column_layers(
    rows: &[Row],
    header_rows: usize,
    col: usize,
    cache: &mut TextCache,
) -> (Vec<String>, Vec<LeafColumn>) {
    let mut chain = Vec::new();
    let mut leaves = Vec::new();

    for row in 0..header_rows {
        let Some(resolved) = resolve_covered(rows, CellPos::new(row, col)) else {
            continue;
        };
        let cell = resolved.cell;

        if let Some(split) = &cell.split {
            if resolved.pos.col == col && leaves.is_empty() {
                collect_leaves(split, &chain, &[], cache, 0, &mut leaves);
            }
        }

        let layers = cell_layers(cell, cache);
        let stop = cell.is_split() && layers.len() > 1;
        for layer in layers {
            push_layer(&mut chain, layer);
        }
        if stop {
            break;
        }
    }

    (chain, leaves)
}

fn push_layer(chain: &mut Vec<String>, layer: String) {
    if layer.is_empty() || chain.last() == Some(&layer) {
        return;
    }
    chain.push(layer);
}

/// Layers contributed by one resolved header cell
fn cell_layers(cell: &Cell, cache: &mut TextCache) -> Vec<String> {
    match &cell.split {
        Some(split) => split_layers(split, cache, 0),
        None => {
            let text = cache.text(&cell.content);
            if text.is_empty() {
                Vec::new()
            } else {
                vec![text.to_owned()]
            }
        }
    }
}

/// One layer per sub-row: de-duplicated sub-column labels joined with `" / "`
fn split_layers(split: &SplitGrid, cache: &mut TextCache, depth: usize) -> Vec<String> {
    let mut layers = Vec::new();
    if depth >= MAX_SPLIT_DEPTH {
        return layers;
    }

    let (rows, cols) = split.extent();
    for row in 0..rows {
        if layers.len() >= MAX_HEADER_LAYERS {
            break;
        }
        let mut labels: Vec<String> = Vec::new();
        for col in 0..cols {
            let Some(resolved) = resolve_in_split(split, CellPos::new(row, col)) else {
                continue;
            };
            let label = compact_label(resolved.cell, cache, depth + 1);
            if !label.is_empty() && !labels.contains(&label) {
                labels.push(label);
            }
        }
        push_layer(&mut layers, labels.join(LABEL_SEPARATOR));
    }

    layers
}

/// A sub-cell as a single label; nested splits are flattened
fn compact_label(cell: &Cell, cache: &mut TextCache, depth: usize) -> String {
    match &cell.split {
        Some(split) => split_layers(split, cache, depth).join(LABEL_SEPARATOR),
        None => cache.text(&cell.content).to_owned(),
    }
}

/// Enumerate the leaf sub-columns below a split header cell
///
/// A sub-column yields a leaf only if at least one of its sub-cells
/// resolves. When a sub-column descends into a nested split, the labels of
/// the sub-rows below that split are appended to every nested leaf.
fn collect_leaves(
    split: &SplitGrid,
    chain: &[String],
    path: &[usize],
    cache: &mut TextCache,
    depth: usize,
    out: &mut Vec<LeafColumn>,
) {
    if depth >= MAX_SPLIT_DEPTH {
        tracing::debug!("split nesting exceeds {} levels, truncating leaves", MAX_SPLIT_DEPTH);
        if !path.is_empty() {
            out.push(LeafColumn {
                path: path.to_vec(),
                chain: chain.to_vec(),
            });
        }
        return;
    }

    let horizontal = split.cols > 1;
    let (rows, cols) = split.extent();
    for col in 0..cols {
        let mut col_chain = chain.to_vec();
        let mut col_path = path.to_vec();
        if horizontal {
            col_path.push(col);
        }

        let mut resolvable = false;
        let mut nested: Option<Vec<LeafColumn>> = None;
        for row in 0..rows {
            let Some(resolved) = resolve_in_split(split, CellPos::new(row, col)) else {
                continue;
            };
            resolvable = true;
            let first_split = nested.is_none() && resolved.pos.col == col;
            if let Some(inner) = resolved.cell.split.as_ref().filter(|_| first_split) {
                let mut inner_leaves = Vec::new();
                collect_leaves(inner, &col_chain, &col_path, cache, depth + 1, &mut inner_leaves);
                nested = Some(inner_leaves);
                continue;
            }

            let label = compact_label(resolved.cell, cache, depth + 1);
            match &mut nested {
                Some(inner_leaves) => {
                    for leaf in inner_leaves.iter_mut() {
                        push_layer(&mut leaf.chain, label.clone());
                    }
                }
                None => push_layer(&mut col_chain, label),
            }
        }

        match nested {
            Some(inner_leaves) => out.extend(inner_leaves),
            None if resolvable && !col_path.is_empty() => out.push(LeafColumn {
                path: col_path,
                chain: col_chain,
            }),
            None => {}
        }
    }
}

/// A rendered body sub-cell and the leaf path it sits under
#[derive(Debug, Clone, PartialEq)]
pub struct BodyLeaf<'a> {
    /// Sub-column indices taken through horizontal splits (may be empty)
    pub leaf_path: Vec<usize>,
    /// The rendered sub-cell
    pub cell: &'a Cell,
}

/// Enumerate the rendered sub-cells of a body cell with their leaf paths
///
/// Uses the same descent as header leaves, so a body sub-cell's path can be
/// compared with a leaf [`ColumnTarget`]. Returns nothing for a plain cell.
pub fn body_leaf_cells(cell: &Cell) -> Vec<BodyLeaf<'_>> {
    let mut out = Vec::new();
    if let Some(split) = &cell.split {
        collect_body_leaves(split, &[], 0, &mut out);
    }
    out
}

fn collect_body_leaves<'a>(
    split: &'a SplitGrid,
    path: &[usize],
    depth: usize,
    out: &mut Vec<BodyLeaf<'a>>,
) {
    if depth >= MAX_SPLIT_DEPTH {
        return;
    }

    let horizontal = split.cols > 1;
    let (rows, cols) = split.extent();
    for row in 0..rows {
        for col in 0..cols {
            let Some(cell) = split.cell_at(row, col) else {
                continue;
            };
            if cell.is_covered() {
                continue;
            }
            let mut leaf_path = path.to_vec();
            if horizontal {
                leaf_path.push(col);
            }
            match &cell.split {
                Some(inner) => collect_body_leaves(inner, &leaf_path, depth + 1, out),
                None => out.push(BodyLeaf { leaf_path, cell }),
            }
        }
    }
}
