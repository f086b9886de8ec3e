//! HTTP server for `gutensuggest`.
//!
//! This module exposes the autocomplete page and a small HTTP+JSON
//! API over the loaded catalog:
//!
//! - `GET /` – the autocomplete page.
//! - `GET /v1/suggest` (query string) and `POST /v1/suggest` (JSON
//!   `SuggestRequest`) – return a `SuggestionResult`.
//! - `GET /v1/resolve` – returns the library `Resolution` for a
//!   selected or typed query.
//! - `GET /go` – redirects the browser to the resolved library URL.
//! - `GET /v1/catalog/info` – catalog counts and load time.
//! - `GET /v1/health` – simple health check endpoint.
//!
//! The server is intentionally thin: it performs (de)serialization,
//! delegates to the suggestion engine and redirect builder, and
//! converts errors into JSON HTTP responses.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::catalog::Catalog;
use crate::models::{CatalogInfo, ResolveRequest, Resolution, SuggestRequest, SuggestionResult};
use crate::{redirect, suggest};

const INDEX_HTML: &str = include_str!("index.html");

/// Shared, read-only state handed to every request.
#[derive(Debug)]
pub struct AppState {
    pub catalog: Catalog,
    /// Base URL of the library site redirects point at.
    pub library_url: String,
}

impl AppState {
    pub fn new(catalog: Catalog, library_url: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            catalog,
            library_url: library_url.into(),
        })
    }
}

/// Simple health-check response payload.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// JSON error body returned by the API.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Error type used by HTTP handlers to map internal failures into
/// JSON error responses.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Resolve only fails on input it cannot turn into a URL.
        ApiError::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Build the Axum router for the suggestion API.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/v1/health", get(health))
        .route("/v1/suggest", get(suggest_query).post(suggest_json))
        .route("/v1/resolve", get(resolve))
        .route("/go", get(go))
        .route("/v1/catalog/info", get(catalog_info))
        .with_state(state)
}

/// Run the HTTP server bound to the provided socket address.
///
/// This is used by the CLI `gutensuggest serve` subcommand.
pub async fn run(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_with_listener(listener, state).await
}

/// Run the HTTP server using an existing `TcpListener`.
pub async fn serve_with_listener(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    if let Ok(local) = listener.local_addr() {
        tracing::info!(addr = %local, "serving suggestions");
    }
    let app = router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn suggest_query(
    State(state): State<Arc<AppState>>,
    Query(request): Query<SuggestRequest>,
) -> Json<SuggestionResult> {
    Json(run_suggest(&state, &request))
}

async fn suggest_json(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SuggestRequest>,
) -> Json<SuggestionResult> {
    Json(run_suggest(&state, &request))
}

fn run_suggest(state: &AppState, request: &SuggestRequest) -> SuggestionResult {
    let result = suggest::suggest(&state.catalog, request);
    tracing::debug!(
        query = %request.query,
        mode = ?request.mode,
        field = ?request.field,
        returned = result.suggestions.len(),
        total = result.summary.total_matches,
        "suggest"
    );
    result
}

async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(request): Query<ResolveRequest>,
) -> Result<Json<Resolution>, ApiError> {
    let resolution = redirect::resolve(&state.catalog, &request, &state.library_url)?;
    Ok(Json(resolution))
}

async fn go(
    State(state): State<Arc<AppState>>,
    Query(request): Query<ResolveRequest>,
) -> Result<Redirect, ApiError> {
    let resolution = redirect::resolve(&state.catalog, &request, &state.library_url)?;
    tracing::info!(query = %request.query, url = %resolution.url, ok = resolution.ok, "redirect");
    Ok(Redirect::to(&resolution.url))
}

async fn catalog_info(State(state): State<Arc<AppState>>) -> Json<CatalogInfo> {
    Json(state.catalog.info())
}
