use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

/// Download the catalog CSV from `url` into `dest`.
///
/// The body is written to a sibling `.part` file first and renamed
/// into place, so an interrupted download never leaves a truncated
/// catalog behind. Parent directories are created as needed.
pub fn download_catalog(url: &str, dest: &Path) -> Result<PathBuf> {
    let client = Client::builder()
        .timeout(Duration::from_secs(300))
        .build()
        .context("failed to build HTTP client")?;

    tracing::info!(%url, dest = %dest.display(), "downloading catalog");

    let response = client
        .get(url)
        .send()
        .with_context(|| format!("failed to send request to {}", url))?
        .error_for_status()
        .with_context(|| format!("server returned error for {}", url))?;

    let body = response
        .bytes()
        .with_context(|| format!("failed to read catalog body from {}", url))?;

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let partial = dest.with_extension("part");
    fs::write(&partial, &body)
        .with_context(|| format!("failed to write {}", partial.display()))?;
    fs::rename(&partial, dest)
        .with_context(|| format!("failed to move catalog into {}", dest.display()))?;

    tracing::info!(bytes = body.len(), dest = %dest.display(), "catalog downloaded");

    Ok(dest.to_path_buf())
}
