//! Build the library URL a selection redirects to.
//!
//! A query that names a catalog title exactly goes straight to that
//! ebook's page; anything else (an author, a partial title, raw text
//! typed without picking a suggestion) falls back to the site search.

use anyhow::{bail, Context, Result};
use reqwest::Url;

use crate::catalog::Catalog;
use crate::models::{Field, ResolveRequest, Resolution};

const FOUND_MESSAGE: &str = "Happy reading!";
const TITLE_NOT_FOUND_MESSAGE: &str =
    "No Project Gutenberg book has exactly this title. Showing search results instead; check the spelling.";
const AUTHOR_SEARCH_MESSAGE: &str = "Showing search results for this author.";

/// Resolve a selected or typed query into a URL on `library_url`.
pub fn resolve(catalog: &Catalog, request: &ResolveRequest, library_url: &str) -> Result<Resolution> {
    let query = request.query.trim();
    if query.is_empty() {
        bail!("resolve query must not be empty");
    }

    if request.field == Field::Title {
        if let Some(id) = catalog.title_id(query) {
            return Ok(Resolution {
                ok: true,
                url: ebook_url(library_url, id)?,
                message: FOUND_MESSAGE.to_string(),
            });
        }
    }

    let message = match request.field {
        Field::Title => TITLE_NOT_FOUND_MESSAGE,
        Field::Author => AUTHOR_SEARCH_MESSAGE,
    };

    Ok(Resolution {
        ok: false,
        url: search_url(library_url, query)?,
        message: message.to_string(),
    })
}

/// `{library}/ebooks/{id}`.
pub fn ebook_url(library_url: &str, id: &str) -> Result<String> {
    let mut url = base_url(library_url)?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("library URL cannot be a base: {library_url}"))?
        .pop_if_empty()
        .extend(["ebooks", id]);
    Ok(url.into())
}

/// `{library}/ebooks/search/?query={text}` with `text` form-encoded.
pub fn search_url(library_url: &str, text: &str) -> Result<String> {
    let mut url = base_url(library_url)?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("library URL cannot be a base: {library_url}"))?
        .pop_if_empty()
        .extend(["ebooks", "search", ""]);
    url.query_pairs_mut().append_pair("query", text);
    Ok(url.into())
}

fn base_url(library_url: &str) -> Result<Url> {
    Url::parse(library_url).with_context(|| format!("invalid library URL {library_url}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogRecord;
    use crate::models::DEFAULT_LIBRARY_URL;
    use std::path::Path;

    fn catalog() -> Catalog {
        Catalog::from_records(
            Path::new("mem"),
            vec![CatalogRecord {
                id: "2701".to_string(),
                title: "Moby Dick; Or, The Whale".to_string(),
                authors: "Melville, Herman, 1819-1891".to_string(),
            }],
        )
    }

    fn request(query: &str, field: Field) -> ResolveRequest {
        ResolveRequest {
            query: query.to_string(),
            field,
        }
    }

    #[test]
    fn exact_title_resolves_to_ebook_page() {
        let resolution = resolve(
            &catalog(),
            &request("  Moby Dick; Or, The Whale ", Field::Title),
            DEFAULT_LIBRARY_URL,
        )
        .expect("resolution");
        assert!(resolution.ok);
        assert_eq!(resolution.url, "https://www.gutenberg.org/ebooks/2701");
        assert_eq!(resolution.message, FOUND_MESSAGE);
    }

    #[test]
    fn unknown_title_falls_back_to_search() {
        let resolution = resolve(
            &catalog(),
            &request("moby dick", Field::Title),
            DEFAULT_LIBRARY_URL,
        )
        .expect("resolution");
        assert!(!resolution.ok);
        assert_eq!(
            resolution.url,
            "https://www.gutenberg.org/ebooks/search/?query=moby+dick"
        );
    }

    #[test]
    fn author_always_uses_search() {
        let resolution = resolve(
            &catalog(),
            &request("Melville, Herman, 1819-1891", Field::Author),
            DEFAULT_LIBRARY_URL,
        )
        .expect("resolution");
        assert!(!resolution.ok);
        assert_eq!(resolution.message, AUTHOR_SEARCH_MESSAGE);
        assert!(resolution
            .url
            .starts_with("https://www.gutenberg.org/ebooks/search/?query=Melville%2C+Herman"));
    }

    #[test]
    fn empty_query_is_rejected() {
        let err = resolve(&catalog(), &request("   ", Field::Title), DEFAULT_LIBRARY_URL)
            .expect_err("empty query");
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn urls_respect_custom_library_base() {
        assert_eq!(
            ebook_url("http://mirror.example/", "84").expect("url"),
            "http://mirror.example/ebooks/84"
        );
        assert_eq!(
            search_url("http://mirror.example/pg", "Les Misérables & co").expect("url"),
            "http://mirror.example/pg/ebooks/search/?query=Les+Mis%C3%A9rables+%26+co"
        );
        assert!(search_url("not a url", "x").is_err());
    }
}
