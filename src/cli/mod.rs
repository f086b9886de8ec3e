use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::catalog::{download_catalog, Catalog};
use crate::redirect;
use crate::server::{self, AppState};
use crate::suggest;

mod args;
mod config;
mod format;
mod http_backend;

pub use args::{
    Cli, Commands, FetchArgs, FieldArg, OutputFormat, ResolveArgs, ServeArgs, SuggestArgs,
    SuggestModeArg,
};

use config::{
    apply_fetch_config_defaults, apply_resolve_config_defaults, apply_serve_config_defaults,
    apply_suggest_config_defaults, load_cli_config,
};
use http_backend::HttpSuggestBackend;

/// Entry point for the CLI binary.
pub fn run() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cli_config = load_cli_config()?;

    match cli.command {
        Some(Commands::Suggest(mut suggest_args)) => {
            if let Some(ref config) = cli_config {
                apply_suggest_config_defaults(config, &mut suggest_args);
            }

            let request = args::suggest_request_from_args(&suggest_args)?;
            let result = if let Some(server_url) =
                effective_server_url(suggest_args.server.as_deref(), suggest_args.no_server)
            {
                let backend = HttpSuggestBackend::new(server_url)?;
                backend.suggest(&request)?
            } else {
                let catalog = Catalog::load(&args::catalog_path(suggest_args.catalog.as_ref()))?;
                suggest::suggest(&catalog, &request)
            };

            match suggest_args.format {
                OutputFormat::Text => format::print_suggestions_text(&result),
                OutputFormat::Json => {
                    serde_json::to_writer(std::io::stdout(), &result)?;
                    println!();
                    Ok(())
                }
            }
        }
        Some(Commands::Resolve(mut resolve_args)) => {
            if let Some(ref config) = cli_config {
                apply_resolve_config_defaults(config, &mut resolve_args);
            }

            let request = args::resolve_request_from_args(&resolve_args)?;
            let resolution = if let Some(server_url) =
                effective_server_url(resolve_args.server.as_deref(), resolve_args.no_server)
            {
                let backend = HttpSuggestBackend::new(server_url)?;
                backend.resolve(&request)?
            } else {
                let catalog = Catalog::load(&args::catalog_path(resolve_args.catalog.as_ref()))?;
                let library_url = args::library_url(resolve_args.library_url.as_ref());
                redirect::resolve(&catalog, &request, &library_url)?
            };

            match resolve_args.format {
                OutputFormat::Text => format::print_resolution_text(&resolution),
                OutputFormat::Json => {
                    serde_json::to_writer(std::io::stdout(), &resolution)?;
                    println!();
                    Ok(())
                }
            }
        }
        Some(Commands::Fetch(mut fetch_args)) => {
            if let Some(ref config) = cli_config {
                apply_fetch_config_defaults(config, &mut fetch_args);
            }

            let url = args::catalog_url(fetch_args.catalog_url.as_ref());
            let dest = args::catalog_path(fetch_args.output.as_ref());
            let path = download_catalog(&url, &dest)?;
            println!("Downloaded catalog to {}", path.display());
            Ok(())
        }
        Some(Commands::Serve(mut serve_args)) => {
            if let Some(ref config) = cli_config {
                apply_serve_config_defaults(config, &mut serve_args);
            }
            serve(serve_args)
        }
        None => {
            let mut serve_args = ServeArgs::default();
            if let Some(ref config) = cli_config {
                apply_serve_config_defaults(config, &mut serve_args);
            }
            serve(serve_args)
        }
    }
}

/// Load the catalog (downloading it first when asked) and block on
/// the HTTP server. Any catalog failure aborts startup.
fn serve(serve_args: ServeArgs) -> Result<()> {
    let addr: SocketAddr = serve_args
        .addr
        .parse()
        .with_context(|| format!("invalid listen address {}", serve_args.addr))?;

    let catalog_path = args::catalog_path(serve_args.catalog.as_ref());
    if serve_args.download {
        let url = args::catalog_url(serve_args.catalog_url.as_ref());
        download_catalog(&url, &catalog_path)?;
    }

    let catalog = load_catalog_for_serving(&catalog_path)?;
    let state = AppState::new(catalog, args::library_url(serve_args.library_url.as_ref()));

    println!("Starting gutensuggest HTTP server on http://{addr}");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(server::run(addr, state))?;
    Ok(())
}

fn load_catalog_for_serving(path: &Path) -> Result<Catalog> {
    Catalog::load(path).with_context(|| {
        format!(
            "cannot start without a catalog; run `gutensuggest fetch` or pass --download (looked for {})",
            path.display()
        )
    })
}

fn effective_server_url(server_flag: Option<&str>, no_server: bool) -> Option<String> {
    if no_server {
        None
    } else {
        server_flag.map(|s| s.to_string())
    }
}

/// Log to stderr so stdout stays clean for `--format json`. The
/// filter comes from `RUST_LOG`, defaulting to `info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
