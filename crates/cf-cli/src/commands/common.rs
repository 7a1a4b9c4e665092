//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

use cf_core::config::Config;
use cf_core::partition::PartitionKey;
use cf_core::store::PartitionStore;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Intentionally empty: ExitCode is a control-flow mechanism, not a
        // user-facing error.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Resolve the project root from global CLI arguments.
pub(crate) fn project_root(global: &GlobalArgs) -> PathBuf {
    PathBuf::from(&global.project_dir)
}

/// Load the project configuration from `--config` or the project directory.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&project_root(global)),
    }
    .context("Failed to load project config")?;
    if global.verbose {
        eprintln!("[verbose] loaded config for project '{}'", config.name);
    }
    Ok(config)
}

/// Open the partition store for the configured data root.
pub(crate) fn open_store(config: &Config, global: &GlobalArgs) -> PartitionStore {
    PartitionStore::new(config.data_root_absolute(&project_root(global)))
}

/// Parse an optional partition-key argument, defaulting to today.
pub(crate) fn parse_key_arg(key: &Option<String>) -> Result<PartitionKey> {
    match key {
        Some(s) => PartitionKey::parse(s.clone()).context("Invalid --key"),
        None => Ok(PartitionKey::today()),
    }
}

/// Calculate column widths for a table given headers and row data.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

/// Print a formatted table to stdout.
///
/// Calculates column widths from `headers` and `rows`, then prints a
/// left-aligned header row, a separator line of dashes, and each data row.
/// Columns are separated by two spaces.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);

    let header_parts: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!("{:<width$}", h, width = w))
        .collect();
    println!("{}", header_parts.join("  "));

    let sep_parts: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep_parts.join("  "));

    for row in rows {
        let row_parts: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect();
        println!("{}", row_parts.join("  "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_column_widths() {
        let widths = calculate_column_widths(
            &["STAGE", "KEY"],
            &[vec!["fetch".to_string(), "2024-01-01".to_string()]],
        );
        assert_eq!(widths, vec![5, 10]);
    }

    #[test]
    fn test_parse_key_arg_defaults_to_today() {
        let key = parse_key_arg(&None).unwrap();
        assert_eq!(key, PartitionKey::today());
        assert!(parse_key_arg(&Some("bogus".to_string())).is_err());
    }
}
