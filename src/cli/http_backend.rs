use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder};

use crate::models::{ResolveRequest, Resolution, SuggestRequest, SuggestionResult};

/// HTTP client backend that delegates suggestion and resolve requests
/// to a running `gutensuggest` server.
pub struct HttpSuggestBackend {
    client: Client,
    base_url: String,
}

impl HttpSuggestBackend {
    /// Create a new HTTP backend targeting the given base URL
    /// (e.g. "http://127.0.0.1:5000").
    pub fn new<S: Into<String>>(base_url: S) -> Result<Self> {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Request suggestions via `POST /v1/suggest`.
    pub fn suggest(&self, request: &SuggestRequest) -> Result<SuggestionResult> {
        let url = self.url_for("/v1/suggest");
        self.send(&url, self.client.post(&url).json(request))
    }

    /// Resolve a query via `GET /v1/resolve`.
    pub fn resolve(&self, request: &ResolveRequest) -> Result<Resolution> {
        let url = self.url_for("/v1/resolve");
        self.send(&url, self.client.get(&url).query(request))
    }

    fn send<R>(&self, url: &str, builder: RequestBuilder) -> Result<R>
    where
        R: serde::de::DeserializeOwned,
    {
        let response = builder
            .send()
            .with_context(|| format!("failed to send request to {}", url))?
            .error_for_status()
            .with_context(|| format!("server returned error for {}", url))?;

        let value = response
            .json::<R>()
            .context("failed to decode JSON response from server")?;

        Ok(value)
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_for_joins_without_double_slashes() {
        let backend = HttpSuggestBackend::new("http://127.0.0.1:5000/").expect("backend");
        assert_eq!(
            backend.url_for("/v1/suggest"),
            "http://127.0.0.1:5000/v1/suggest"
        );
    }
}
