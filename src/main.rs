//! Cache Proxy - A forward caching proxy
//!
//! Serves `GET /<key>` requests from a size-bounded in-memory cache with
//! global TTL expiration, fetching misses from a single upstream origin.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_proxy::api::{create_router, AppState};
use cache_proxy::console::{run_console, ConsoleEnd};
use cache_proxy::server::serve;
use cache_proxy::{spawn_reaper, CacheStore, Config, ResolutionService, TcpFetcher};

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration (optional file, then environment)
/// 3. Create the cache store, upstream fetcher and resolution service
/// 4. Start the expiration reaper
/// 5. Start the proxy listener and the admin API
/// 6. Run the operator console; shut down on `exit`, Ctrl+C or SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cache_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Cache Proxy");

    let config = Config::load()?;
    info!(
        "Configuration loaded: proxy_port={}, upstream={}:{}, ttl={}ms, max_cache_bytes={}, admin_port={}",
        config.proxy_port,
        config.upstream_host,
        config.upstream_port,
        config.ttl_ms,
        config.max_cache_bytes,
        config.admin_port
    );

    let store = CacheStore::new(config.max_cache_bytes, config.ttl()).shared();
    let fetcher = Arc::new(TcpFetcher::new(
        config.upstream_host.clone(),
        config.upstream_port,
    ));
    let service = ResolutionService::new(store.clone(), fetcher);

    let reaper = spawn_reaper(store, config.reaper_interval());

    let proxy_addr = SocketAddr::from(([0, 0, 0, 0], config.proxy_port));
    let proxy_listener = TcpListener::bind(proxy_addr)
        .await
        .with_context(|| format!("binding proxy port {}", config.proxy_port))?;
    let proxy = tokio::spawn(serve(
        proxy_listener,
        service.clone(),
        config.max_connections,
    ));

    let admin_addr = SocketAddr::from(([0, 0, 0, 0], config.admin_port));
    let admin_listener = TcpListener::bind(admin_addr)
        .await
        .with_context(|| format!("binding admin port {}", config.admin_port))?;
    info!("Admin API listening on http://{}", admin_addr);
    let app = create_router(AppState::new(service.clone()));
    let admin = tokio::spawn(async move {
        if let Err(e) = axum::serve(admin_listener, app).await {
            warn!("Admin API stopped: {}", e);
        }
    });

    // Only an explicit `exit` shuts the proxy down; once stdin is gone the
    // proxy keeps serving until a signal arrives.
    let console = async {
        let stdin = BufReader::new(tokio::io::stdin());
        match run_console(stdin, tokio::io::stdout(), &service).await {
            Ok(ConsoleEnd::Exit) => return,
            Ok(ConsoleEnd::InputClosed) => {
                info!("Console input closed, serving until Ctrl+C or SIGTERM")
            }
            Err(e) => warn!("Console failed, serving until Ctrl+C or SIGTERM: {}", e),
        }
        std::future::pending::<()>().await
    };

    tokio::select! {
        _ = console => info!("Console exit requested, initiating shutdown..."),
        _ = shutdown_signal() => {}
    }

    reaper.abort();
    proxy.abort();
    admin.abort();
    info!("Proxy shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
