use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::args::{FieldArg, OutputFormat, SuggestModeArg, DEFAULT_ADDR};
use crate::cli::{FetchArgs, ResolveArgs, ServeArgs, SuggestArgs};

/// Top-level representation of `.gutensuggest/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub serve: Option<ServeSection>,

    #[serde(default)]
    pub catalog: Option<CatalogSection>,

    #[serde(default)]
    pub suggest: Option<SuggestSection>,

    #[serde(default)]
    pub http: Option<HttpSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServeSection {
    #[serde(default)]
    pub addr: Option<String>,
    #[serde(default)]
    pub download: Option<bool>,
    #[serde(default)]
    pub library_url: Option<String>,
}

/// Where the catalog lives; shared by every subcommand.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogSection {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SuggestSection {
    #[serde(default)]
    pub mode: Option<SuggestModeArg>,
    #[serde(default)]
    pub field: Option<FieldArg>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub no_server: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HttpSection {
    #[serde(default)]
    pub server_url: Option<String>,
}

/// Discover and load a project-local `.gutensuggest/config.toml`
/// starting from the current working directory and walking up parent
/// directories.
pub fn load_cli_config() -> Result<Option<CliConfig>> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let config_path = find_project_config(&cwd);

    let Some(path) = config_path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: CliConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse TOML config at {}", path.display()))?;

    tracing::debug!(path = %path.display(), "loaded project config");

    Ok(Some(config))
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);

    while let Some(current) = dir {
        let config_toml = current.join(".gutensuggest").join("config.toml");
        if config_toml.is_file() {
            return Some(config_toml);
        }

        dir = current.parent();
    }

    None
}

fn catalog_path_default(config: &CliConfig, current: &mut Option<PathBuf>) {
    if current.is_none() {
        if let Some(path) = config.catalog.as_ref().and_then(|c| c.path.as_ref()) {
            *current = Some(path.clone());
        }
    }
}

fn server_default(config: &CliConfig, current: &mut Option<String>) {
    if current.is_none() {
        if let Some(url) = config.http.as_ref().and_then(|h| h.server_url.as_ref()) {
            *current = Some(url.clone());
        }
    }
}

pub fn apply_serve_config_defaults(config: &CliConfig, args: &mut ServeArgs) {
    catalog_path_default(config, &mut args.catalog);

    if args.catalog_url.is_none() {
        if let Some(url) = config.catalog.as_ref().and_then(|c| c.url.as_ref()) {
            args.catalog_url = Some(url.clone());
        }
    }

    if let Some(serve) = &config.serve {
        if args.addr == DEFAULT_ADDR {
            if let Some(addr) = &serve.addr {
                args.addr = addr.clone();
            }
        }

        if !args.download {
            if let Some(true) = serve.download {
                args.download = true;
            }
        }

        if args.library_url.is_none() {
            if let Some(url) = &serve.library_url {
                args.library_url = Some(url.clone());
            }
        }
    }
}

pub fn apply_suggest_config_defaults(config: &CliConfig, args: &mut SuggestArgs) {
    catalog_path_default(config, &mut args.catalog);
    server_default(config, &mut args.server);

    if let Some(suggest) = &config.suggest {
        if matches!(args.mode, SuggestModeArg::Prefix) {
            if let Some(mode) = suggest.mode {
                args.mode = mode;
            }
        }

        if matches!(args.field, FieldArg::Title) {
            if let Some(field) = suggest.field {
                args.field = field;
            }
        }

        if matches!(args.format, OutputFormat::Text) {
            if let Some(format) = suggest.format {
                args.format = format;
            }
        }

        if !args.no_server {
            if let Some(true) = suggest.no_server {
                args.no_server = true;
            }
        }
    }
}

pub fn apply_resolve_config_defaults(config: &CliConfig, args: &mut ResolveArgs) {
    catalog_path_default(config, &mut args.catalog);
    server_default(config, &mut args.server);

    if args.library_url.is_none() {
        if let Some(url) = config.serve.as_ref().and_then(|s| s.library_url.as_ref()) {
            args.library_url = Some(url.clone());
        }
    }

    if let Some(suggest) = &config.suggest {
        if matches!(args.format, OutputFormat::Text) {
            if let Some(format) = suggest.format {
                args.format = format;
            }
        }

        if !args.no_server {
            if let Some(true) = suggest.no_server {
                args.no_server = true;
            }
        }
    }
}

pub fn apply_fetch_config_defaults(config: &CliConfig, args: &mut FetchArgs) {
    catalog_path_default(config, &mut args.output);

    if args.catalog_url.is_none() {
        if let Some(url) = config.catalog.as_ref().and_then(|c| c.url.as_ref()) {
            args.catalog_url = Some(url.clone());
        }
    }
}
