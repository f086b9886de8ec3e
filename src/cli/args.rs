use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::models::{
    Field, ResolveRequest, SuggestMode, SuggestRequest, DEFAULT_CATALOG_PATH,
    DEFAULT_CATALOG_URL, DEFAULT_LIBRARY_URL,
};

/// Address the server binds to when neither a flag nor the project
/// config names one.
pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";

/// Top-level CLI entrypoint for `gutensuggest`.
#[derive(Parser, Debug)]
#[command(
    name = "gutensuggest",
    about = "Project Gutenberg title and author autocomplete server",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level CLI subcommands. Running without one starts the server.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the catalog and run the HTTP server.
    Serve(ServeArgs),
    /// Print suggestions for a query.
    Suggest(SuggestArgs),
    /// Print the library URL a query redirects to.
    Resolve(ResolveArgs),
    /// Download the Gutenberg catalog CSV.
    Fetch(FetchArgs),
}

/// Arguments specific to the `serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Socket address to listen on.
    #[arg(long = "addr", default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// Catalog file to load (`.csv` feed or `.jsonl`).
    #[arg(long = "catalog")]
    pub catalog: Option<PathBuf>,

    /// Download the catalog before loading it.
    #[arg(long = "download")]
    pub download: bool,

    /// URL of the catalog CSV used with `--download`.
    #[arg(long = "catalog-url")]
    pub catalog_url: Option<String>,

    /// Base URL of the library site redirects point at.
    #[arg(long = "library-url")]
    pub library_url: Option<String>,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            catalog: None,
            download: false,
            catalog_url: None,
            library_url: None,
        }
    }
}

/// Arguments specific to the `suggest` subcommand.
#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// Text typed by the user (a regular expression with `--mode regex`).
    pub query: String,

    /// Matching mode.
    #[arg(long = "mode", value_enum, default_value_t = SuggestModeArg::Prefix)]
    pub mode: SuggestModeArg,

    /// Catalog column to search.
    #[arg(long = "field", value_enum, default_value_t = FieldArg::Title)]
    pub field: FieldArg,

    /// Catalog file to load for local suggestions.
    #[arg(long = "catalog")]
    pub catalog: Option<PathBuf>,

    /// Output format (text or json).
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Optional server URL for delegating to a running server.
    ///
    /// When set (either via this flag or the `GUTENSUGGEST_SERVER_URL`
    /// environment variable), the CLI sends the request to the HTTP
    /// server instead of loading the catalog locally. Use
    /// `--no-server` to force local execution.
    #[arg(long = "server", env = "GUTENSUGGEST_SERVER_URL")]
    pub server: Option<String>,

    /// Disable use of any configured server and force local execution.
    #[arg(long = "no-server")]
    pub no_server: bool,
}

/// Arguments specific to the `resolve` subcommand.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Selected suggestion or raw typed text.
    pub query: String,

    /// Catalog column the query came from.
    #[arg(long = "field", value_enum, default_value_t = FieldArg::Title)]
    pub field: FieldArg,

    /// Catalog file to load for local resolution.
    #[arg(long = "catalog")]
    pub catalog: Option<PathBuf>,

    /// Base URL of the library site.
    #[arg(long = "library-url")]
    pub library_url: Option<String>,

    /// Output format (text or json).
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Optional server URL for delegating to a running server.
    #[arg(long = "server", env = "GUTENSUGGEST_SERVER_URL")]
    pub server: Option<String>,

    /// Disable use of any configured server and force local execution.
    #[arg(long = "no-server")]
    pub no_server: bool,
}

/// Arguments specific to the `fetch` subcommand.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// URL of the catalog CSV.
    #[arg(long = "catalog-url")]
    pub catalog_url: Option<String>,

    /// Where to write the catalog.
    #[arg(long = "output")]
    pub output: Option<PathBuf>,
}

/// CLI representation of the suggestion mode.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestModeArg {
    Prefix,
    #[serde(alias = "regexp")]
    Regex,
    Trigram,
}

impl SuggestModeArg {
    pub fn to_model(self) -> SuggestMode {
        match self {
            SuggestModeArg::Prefix => SuggestMode::Prefix,
            SuggestModeArg::Regex => SuggestMode::Regex,
            SuggestModeArg::Trigram => SuggestMode::Trigram,
        }
    }
}

/// CLI representation of the catalog field.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldArg {
    Title,
    Author,
}

impl FieldArg {
    pub fn to_model(self) -> Field {
        match self {
            FieldArg::Title => Field::Title,
            FieldArg::Author => Field::Author,
        }
    }
}

/// CLI representation of output format.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn suggest_request_from_args(args: &SuggestArgs) -> Result<SuggestRequest> {
    if args.query.is_empty() {
        bail!("query must not be empty");
    }

    Ok(SuggestRequest {
        query: args.query.clone(),
        mode: args.mode.to_model(),
        field: args.field.to_model(),
    })
}

pub fn resolve_request_from_args(args: &ResolveArgs) -> Result<ResolveRequest> {
    if args.query.trim().is_empty() {
        bail!("query must not be empty");
    }

    Ok(ResolveRequest {
        query: args.query.clone(),
        field: args.field.to_model(),
    })
}

/// Catalog path from a flag, falling back to the default location.
pub fn catalog_path(flag: Option<&PathBuf>) -> PathBuf {
    flag.cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH))
}

pub fn catalog_url(flag: Option<&String>) -> String {
    flag.cloned()
        .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string())
}

pub fn library_url(flag: Option<&String>) -> String {
    flag.cloned()
        .unwrap_or_else(|| DEFAULT_LIBRARY_URL.to_string())
}
