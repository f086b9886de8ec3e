//! In-memory Gutenberg catalog.
//!
//! The catalog is loaded once at startup and never mutated
//! afterwards; the server shares it between requests behind an `Arc`
//! without any locking. A missing or malformed catalog file is a
//! startup error.

mod download;
pub mod normalize;
pub mod source;

pub use download::download_catalog;
pub use source::{read_records, CatalogRecord};

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::models::{CatalogEntry, CatalogInfo, Field};
use crate::suggest::trigram::TrigramIndex;
use normalize::{normalize_title, split_authors};

/// Immutable title and author lists plus their lookup structures.
#[derive(Debug)]
pub struct Catalog {
    source: PathBuf,
    titles: Vec<CatalogEntry>,
    authors: Vec<CatalogEntry>,
    title_ids: HashMap<String, String>,
    title_trigrams: TrigramIndex,
    author_trigrams: TrigramIndex,
    loaded_at: Option<String>,
}

impl Catalog {
    /// Load and preprocess the catalog file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let records = read_records(path)?;
        let catalog = Self::from_records(path, records);

        if catalog.titles.is_empty() {
            bail!("catalog at {} contains no titles", path.display());
        }

        tracing::info!(
            source = %path.display(),
            titles = catalog.titles.len(),
            authors = catalog.authors.len(),
            "loaded catalog"
        );

        Ok(catalog)
    }

    /// Build a catalog from raw records, preserving record order.
    ///
    /// Titles have embedded newlines flattened and are deduplicated by
    /// display text; the first record wins. Authors are split on `;`
    /// and deduplicated by normalized name, keeping the first raw
    /// spelling for display.
    pub fn from_records<I>(source: &Path, records: I) -> Self
    where
        I: IntoIterator<Item = CatalogRecord>,
    {
        let mut titles = Vec::new();
        let mut authors = Vec::new();
        let mut title_ids = HashMap::new();
        let mut seen_authors = HashSet::new();

        for record in records {
            let title = flatten_title(&record.title);
            if !title.is_empty() && !title_ids.contains_key(&title) {
                let id = record.id.trim().to_string();
                title_ids.insert(title.clone(), id.clone());
                titles.push(CatalogEntry {
                    normalized: normalize_title(&title),
                    display: title,
                    id,
                });
            }

            for (raw, normalized) in split_authors(&record.authors) {
                if seen_authors.insert(normalized.clone()) {
                    authors.push(CatalogEntry {
                        display: raw.to_string(),
                        id: normalized.clone(),
                        normalized,
                    });
                }
            }
        }

        let title_trigrams = TrigramIndex::build(&titles);
        let author_trigrams = TrigramIndex::build(&authors);

        Self {
            source: source.to_path_buf(),
            titles,
            authors,
            title_ids,
            title_trigrams,
            author_trigrams,
            loaded_at: current_timestamp_rfc3339(),
        }
    }

    /// Entries for the requested field, in catalog order.
    pub fn entries(&self, field: Field) -> &[CatalogEntry] {
        match field {
            Field::Title => &self.titles,
            Field::Author => &self.authors,
        }
    }

    pub fn trigrams(&self, field: Field) -> &TrigramIndex {
        match field {
            Field::Title => &self.title_trigrams,
            Field::Author => &self.author_trigrams,
        }
    }

    /// Ebook id for an exact display title.
    pub fn title_id(&self, title: &str) -> Option<&str> {
        self.title_ids.get(title).map(String::as_str)
    }

    pub fn info(&self) -> CatalogInfo {
        CatalogInfo {
            source: self.source.clone(),
            titles: self.titles.len() as u64,
            authors: self.authors.len() as u64,
            loaded_at: self.loaded_at.clone(),
        }
    }
}

fn flatten_title(raw: &str) -> String {
    raw.replace(['\r', '\n'], " ").trim().to_string()
}

fn current_timestamp_rfc3339() -> Option<String> {
    use time::{format_description::well_known::Rfc3339, OffsetDateTime};

    OffsetDateTime::now_utc().format(&Rfc3339).ok()
}
