//! Slate CLI - table header and conditional rule inspection tool

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use slate_table::prelude::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slate")]
#[command(
    author,
    version,
    about = "Inspect table snapshots: header depth, column catalog and conditional rules"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); overrides RUST_LOG
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the number of header rows
    HeaderDepth {
        /// Table snapshot (JSON)
        table: PathBuf,

        /// Use the persisted count as-is instead of inferring
        #[arg(long)]
        no_infer: bool,
    },

    /// List the column catalog
    #[command(alias = "columns")]
    Catalog {
        /// Table snapshot (JSON)
        table: PathBuf,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate conditional rules and print the resulting patches as JSON
    Evaluate {
        /// Table snapshot (JSON)
        table: PathBuf,

        /// Column rule sets (JSON array)
        rules: PathBuf,

        /// Row of a single cell to evaluate (requires --col)
        #[arg(short, long, requires = "col")]
        row: Option<usize>,

        /// Column of a single cell to evaluate (requires --row)
        #[arg(short, long, requires = "row")]
        col: Option<usize>,

        /// Leaf path of the rendered sub-cell, e.g. `0.1`
        #[arg(short, long, requires = "row", value_parser = parse_leaf_path)]
        leaf: Option<LeafPath>,
    },

    /// Verify merge and cover invariants of a snapshot
    Check {
        /// Table snapshot (JSON)
        table: PathBuf,
    },
}

/// A dotted leaf path such as `0.1`
#[derive(Debug, Clone, PartialEq)]
struct LeafPath(Vec<usize>);

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli.command, &mut out)
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run<W: Write>(command: Commands, out: &mut W) -> Result<()> {
    match command {
        Commands::HeaderDepth { table, no_infer } => header_depth(&table, no_infer, out),
        Commands::Catalog { table, json } => catalog(&table, json, out),
        Commands::Evaluate {
            table,
            rules,
            row,
            col,
            leaf,
        } => {
            let cell = row.zip(col).map(|(r, c)| CellPos::new(r, c));
            evaluate(&table, &rules, cell, leaf.as_ref().map(|l| l.0.as_slice()), out)
        }
        Commands::Check { table } => check(&table, out),
    }
}

fn parse_leaf_path(s: &str) -> std::result::Result<LeafPath, String> {
    s.split('.')
        .map(|p| {
            p.trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid leaf path '{}'", s))
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(LeafPath)
}

fn open_grid(path: &Path, options: GridOptions) -> Result<TableGrid> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let table = Table::from_json(&json)
        .with_context(|| format!("Failed to parse table '{}'", path.display()))?;
    tracing::info!(
        "loaded {} rows x {} columns from {}",
        table.row_count(),
        table.column_count(),
        path.display()
    );
    Ok(TableGrid::with_options(table, options))
}

fn header_depth<W: Write>(path: &Path, no_infer: bool, out: &mut W) -> Result<()> {
    let options = GridOptions {
        infer_header_rows: !no_infer,
    };
    let mut grid = open_grid(path, options)?;
    writeln!(out, "{}", grid.header_row_count())?;
    Ok(())
}

fn catalog<W: Write>(path: &Path, json: bool, out: &mut W) -> Result<()> {
    let mut grid = open_grid(path, GridOptions::default())?;
    let entries = grid.column_entries();

    if json {
        serde_json::to_writer_pretty(&mut *out, entries).context("Failed to write catalog")?;
        writeln!(out)?;
        return Ok(());
    }

    for entry in entries {
        let indent = if entry.kind == ColumnKind::Leaf { "  " } else { "" };
        writeln!(out, "{}{}\t{}", indent, entry.key, entry.label())?;
    }
    Ok(())
}

fn evaluate<W: Write>(
    table: &Path,
    rules: &Path,
    cell: Option<CellPos>,
    leaf: Option<&[usize]>,
    out: &mut W,
) -> Result<()> {
    let mut grid = open_grid(table, GridOptions::default())?;
    let rules_json = std::fs::read_to_string(rules)
        .with_context(|| format!("Failed to read '{}'", rules.display()))?;
    grid.set_rule_sets_json(&rules_json)
        .with_context(|| format!("Failed to parse rule sets '{}'", rules.display()))?;

    match cell {
        Some(pos) => {
            let then = grid.conditional_then(pos, leaf);
            serde_json::to_writer_pretty(&mut *out, &then).context("Failed to write patch")?;
        }
        None => {
            let decisions = grid.evaluate_all();
            tracing::info!("{} cells matched", decisions.len());
            serde_json::to_writer_pretty(&mut *out, &decisions)
                .context("Failed to write patches")?;
        }
    }
    writeln!(out)?;
    Ok(())
}

fn check<W: Write>(path: &Path, out: &mut W) -> Result<()> {
    let grid = open_grid(path, GridOptions::default())?;
    if let Err(e) = grid.check() {
        bail!("'{}' failed the span check: {}", path.display(), e);
    }
    writeln!(out, "ok")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const TABLE: &str = r#"{
        "rows": [
            { "cells": [
                { "content": "Region", "merge": { "rowSpan": 2, "colSpan": 1 } },
                { "content": "Sales", "merge": { "rowSpan": 1, "colSpan": 2 } },
                { "coveredBy": { "row": 0, "col": 1 } }
            ] },
            { "cells": [
                { "coveredBy": { "row": 0, "col": 0 } },
                { "content": "Q1" },
                { "content": "Q2" }
            ] },
            { "cells": [ { "content": "north" }, { "content": "120" }, { "content": "80" } ] }
        ]
    }"#;

    const RULES: &str = r#"[
        { "columnName": "Sales > Q1", "rules": [
            { "when": { "op": "greaterThan", "value": 100 }, "then": { "cellClass": "high" } }
        ] }
    ]"#;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn run_to_string(command: Commands) -> Result<String> {
        let mut out = Vec::new();
        run(command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_header_depth() {
        let dir = TempDir::new().unwrap();
        let table = write(&dir, "table.json", TABLE);

        let inferred = run_to_string(Commands::HeaderDepth {
            table: table.clone(),
            no_infer: false,
        })
        .unwrap();
        assert_eq!(inferred, "2\n");

        let persisted = run_to_string(Commands::HeaderDepth {
            table,
            no_infer: true,
        })
        .unwrap();
        assert_eq!(persisted, "0\n");
    }

    #[test]
    fn test_catalog_listing() {
        let dir = TempDir::new().unwrap();
        let table = write(&dir, "table.json", TABLE);

        let text = run_to_string(Commands::Catalog {
            table: table.clone(),
            json: false,
        })
        .unwrap();
        assert_eq!(
            text,
            "region\tRegion\nsales > q1\tSales > Q1\nsales > q2\tSales > Q2\n"
        );

        let json = run_to_string(Commands::Catalog { table, json: true }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
        assert_eq!(value[1]["name"], "Sales > Q1");
    }

    #[test]
    fn test_evaluate() {
        let dir = TempDir::new().unwrap();
        let table = write(&dir, "table.json", TABLE);
        let rules = write(&dir, "rules.json", RULES);

        let all = run_to_string(Commands::Evaluate {
            table: table.clone(),
            rules: rules.clone(),
            row: None,
            col: None,
            leaf: None,
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&all).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{ "pos": { "row": 2, "col": 1 }, "then": { "cellClass": "high" } }])
        );

        let single = run_to_string(Commands::Evaluate {
            table,
            rules,
            row: Some(2),
            col: Some(2),
            leaf: None,
        })
        .unwrap();
        assert_eq!(single, "null\n");
    }

    #[test]
    fn test_check() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.json", TABLE);
        assert_eq!(run_to_string(Commands::Check { table: good }).unwrap(), "ok\n");

        let bad = write(
            &dir,
            "bad.json",
            r#"{ "rows": [ { "cells": [ { "coveredBy": { "row": 0, "col": 1 } }, { "coveredBy": { "row": 0, "col": 0 } } ] } ] }"#,
        );
        assert!(run_to_string(Commands::Check { table: bad }).is_err());
    }

    #[test]
    fn test_missing_and_malformed_input() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        let err = run_to_string(Commands::Check { table: missing }).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));

        let broken = write(&dir, "broken.json", "{ \"rows\": [");
        let err = run_to_string(Commands::Catalog {
            table: broken,
            json: false,
        })
        .unwrap_err();
        assert!(err.to_string().contains("Failed to parse table"));
    }

    #[test]
    fn test_parse_leaf_path() {
        assert_eq!(parse_leaf_path("0.1").unwrap(), LeafPath(vec![0, 1]));
        assert_eq!(parse_leaf_path("2").unwrap(), LeafPath(vec![2]));
        assert!(parse_leaf_path("a.1").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let args = [
            "slate", "-vv", "evaluate", "t.json", "r.json", "-r", "2", "-c", "1", "--leaf", "0.1",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Evaluate { row, col, leaf, .. } => {
                assert_eq!((row, col), (Some(2), Some(1)));
                assert_eq!(leaf, Some(LeafPath(vec![0, 1])));
            }
            _ => panic!("expected evaluate"),
        }
        assert!(Cli::try_parse_from(["slate", "evaluate", "t.json", "r.json", "-r", "2"]).is_err());
    }
}
