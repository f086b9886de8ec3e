//! Readers for on-disk catalog files.
//!
//! Two formats are supported:
//! - The Gutenberg feed CSV (`pg_catalog.csv`), read by header name.
//!   Only `Text#`, `Title` and `Authors` are used; other columns are
//!   ignored.
//! - JSON lines with `id`, `title` and optional `authors` keys, one
//!   record per line. Blank lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// One raw catalog row before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogRecord {
    #[serde(alias = "Text#")]
    pub id: String,
    #[serde(alias = "Title")]
    pub title: String,
    /// Semicolon-separated author list, possibly empty.
    #[serde(default, alias = "Authors")]
    pub authors: String,
}

/// On-disk catalog format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    JsonLines,
}

impl SourceFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("json") => {
                SourceFormat::JsonLines
            }
            _ => SourceFormat::Csv,
        }
    }
}

/// Read every record from the catalog file at `path`.
pub fn read_records(path: &Path) -> Result<Vec<CatalogRecord>> {
    match SourceFormat::for_path(path) {
        SourceFormat::Csv => read_csv(path),
        SourceFormat::JsonLines => read_json_lines(path),
    }
}

fn read_csv(path: &Path) -> Result<Vec<CatalogRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open catalog at {}", path.display()))?;

    let mut records = Vec::new();
    for (row, result) in reader.deserialize::<CatalogRecord>().enumerate() {
        // Row 1 is the header.
        let record = result
            .with_context(|| format!("malformed catalog row {} in {}", row + 2, path.display()))?;
        records.push(record);
    }

    Ok(records)
}

fn read_json_lines(path: &Path) -> Result<Vec<CatalogRecord>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open catalog at {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }

        let record: CatalogRecord = serde_json::from_str(&line).with_context(|| {
            format!("malformed catalog line {} in {}", idx + 1, path.display())
        })?;
        records.push(record);
    }

    Ok(records)
}
