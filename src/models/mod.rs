//! Shared data models for catalog entries, suggestion requests and
//! results, and redirect resolutions.
//!
//! These types form the stable JSON API surface used by the HTTP
//! server and the CLI `--format=json` output.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Schema version for `SuggestionResult` JSON payloads.
///
/// This version follows semver semantics (MAJOR.MINOR.PATCH):
/// - MAJOR: Breaking changes to required fields or field semantics.
/// - MINOR: Backward-compatible additions (new optional fields).
/// - PATCH: Documentation or internal changes only.
pub const SUGGESTION_RESULT_VERSION: &str = "1.0.0";

/// Maximum number of suggestions returned for a single query.
pub const SUGGESTION_LIMIT: usize = 5;

/// Minimum number of characters (after normalization) before
/// substring and trigram suggestions are produced.
pub const MIN_QUERY_CHARS: usize = 3;

/// Default Gutenberg site used to build redirect URLs.
pub const DEFAULT_LIBRARY_URL: &str = "https://www.gutenberg.org";

/// Location of the official Gutenberg catalog feed.
pub const DEFAULT_CATALOG_URL: &str = "https://www.gutenberg.org/cache/epub/feeds/pg_catalog.csv";

/// Default on-disk location of the catalog CSV.
pub const DEFAULT_CATALOG_PATH: &str = "data/pg_catalog.csv";

/// A single matchable catalog item: a book title or an author name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Text shown to the user, as spelled in the catalog.
    pub display: String,
    /// Normalized form used for substring and trigram matching.
    pub normalized: String,
    /// Identifier used for redirects: the ebook number for titles, the
    /// normalized name for authors.
    pub id: String,
}

/// Which catalog column a query runs against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    #[default]
    Title,
    Author,
}

/// Matching strategy for a suggestion query.
///
/// `Prefix` is a normalized substring match (it matches anywhere in
/// the text, not only at the start), `Regex` searches the display text
/// with a regular expression, and `Trigram` ranks entries by TF-IDF
/// weighted character trigram similarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestMode {
    #[default]
    Prefix,
    #[serde(alias = "regexp")]
    Regex,
    Trigram,
}

/// A suggestion query as accepted by the HTTP API and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestRequest {
    /// Raw text typed by the user.
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub mode: SuggestMode,
    #[serde(default)]
    pub field: Field,
}

/// One suggested catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub display: String,
    pub id: String,
}

impl From<&CatalogEntry> for Suggestion {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            display: entry.display.clone(),
            id: entry.id.clone(),
        }
    }
}

/// Aggregate summary for a suggestion query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionSummary {
    /// Number of catalog entries that matched before truncation.
    pub total_matches: u64,
    /// Whether more entries matched than were returned.
    pub truncated: bool,
}

/// Top-level result of a suggestion query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionResult {
    /// Schema version for this result payload.
    pub version: String,
    /// The query exactly as received.
    pub query: String,
    pub mode: SuggestMode,
    pub field: Field,
    /// Ranked suggestions, most relevant first.
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    pub summary: SuggestionSummary,
}

impl SuggestionResult {
    /// An empty result echoing the request.
    pub fn empty(request: &SuggestRequest) -> Self {
        Self {
            version: SUGGESTION_RESULT_VERSION.to_string(),
            query: request.query.clone(),
            mode: request.mode,
            field: request.field,
            suggestions: Vec::new(),
            summary: SuggestionSummary::default(),
        }
    }
}

/// Request to turn a selected (or raw typed) query into a library URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub field: Field,
}

/// Target URL on the library site for a resolve request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// `true` when the query named a known title and `url` points at
    /// that ebook; `false` when `url` is a site search fallback.
    pub ok: bool,
    pub url: String,
    pub message: String,
}

/// Summary of the loaded catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogInfo {
    /// File the catalog was loaded from.
    pub source: PathBuf,
    /// Number of distinct titles.
    pub titles: u64,
    /// Number of distinct normalized author names.
    pub authors: u64,
    /// RFC 3339 timestamp of when the catalog was loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<String>,
}
