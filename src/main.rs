use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cinevault::config::{RuntimeConfig, DEFAULT_ALLOWED_ORIGINS};
use cinevault::dispatcher::Dispatcher;
use cinevault::middleware::{CorsMiddleware, TracingMiddleware};
use cinevault::registry;
use cinevault::router::Router;
use cinevault::routes::movie_routes;
use cinevault::server::{AppService, HttpServer};
use cinevault::store::MovieStore;

/// In-memory movie catalog HTTP service.
#[derive(Parser, Debug)]
#[command(name = "cinevault", version, about)]
struct Cli {
    /// Address to bind, overrides the PORT environment variable
    #[arg(long)]
    addr: Option<String>,

    /// JSON file with movies to load at startup
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Allowed CORS origin, repeatable; replaces the built-in allow-list
    #[arg(long = "allow-origin")]
    allow_origins: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = RuntimeConfig::from_env();
    may::config().set_stack_size(config.stack_size);

    let store = match &cli.seed {
        Some(path) => {
            let store = MovieStore::from_seed_file(path)?;
            info!(seed = %path.display(), movies = store.len(), "loaded seed data");
            store
        }
        None => MovieStore::new(),
    };

    let origins: Vec<String> = if cli.allow_origins.is_empty() {
        DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect()
    } else {
        cli.allow_origins.clone()
    };
    let cors = Arc::new(
        CorsMiddleware::builder()
            .allow_origins(origins)
            .allow_header("Content-Type")
            .build()
            .context("invalid CORS configuration")?,
    );

    let router = Arc::new(Router::new(movie_routes()));

    let mut dispatcher = Dispatcher::new();
    dispatcher.add_middleware(Arc::new(TracingMiddleware));
    dispatcher.add_middleware(cors.clone());
    // SAFETY: startup-time registration after the may stack size is set.
    unsafe {
        registry::register_all(&mut dispatcher, &store);
    }

    let service = AppService::new(router, Arc::new(dispatcher), cors);

    let addr = cli
        .addr
        .unwrap_or_else(|| format!("0.0.0.0:{}", config.port));
    let handle = HttpServer(service)
        .start(&addr)
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "cinevault listening");

    wait_for_shutdown(handle)?;
    Ok(())
}

#[cfg(unix)]
fn wait_for_shutdown(handle: cinevault::server::ServerHandle) -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("failed to install signal handler")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "shutting down");
    }
    handle.stop();
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: cinevault::server::ServerHandle) -> anyhow::Result<()> {
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("server exited unexpectedly"))
}
