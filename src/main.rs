//! Catalog Cache server binary.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_cache::cache::{CatalogCache, MemoryBackend, RedisBackend};
use catalog_cache::store::{InMemoryProductStore, PgProductStore, ProductStore};
use catalog_cache::{create_router, spawn_cleanup_task, spawn_probe_task, AppState, Config};

/// Main entry point for the catalog server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from `.env` and environment variables
/// 3. Open the product store (Postgres or in-memory)
/// 4. Open the cache (Redis, in-memory or disabled) and its background tasks
/// 5. Serve HTTP until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Catalog Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, postgres={}, redis={}, cache_disabled={}, item_ttl={}s, list_ttl={}s",
        config.server_port,
        config.database_url.is_some(),
        config.redis_url.is_some(),
        config.cache_disabled,
        config.cache_item_ttl,
        config.cache_list_ttl
    );

    let (store, pg) = open_store(&config).await?;
    let mut background = Vec::new();
    let cache = open_cache(&config, &mut background).await?;

    if cache.is_enabled() {
        background.push(spawn_probe_task(cache.clone(), config.cache_probe_interval));
        info!("Cache liveness probe started");
    }

    let app = create_router(AppState::from_parts(store, cache, config.cache_ttl()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(background))
        .await
        .context("server error")?;

    if let Some(pg) = pg {
        pg.close().await;
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn open_store(
    config: &Config,
) -> anyhow::Result<(Arc<dyn ProductStore>, Option<PgProductStore>)> {
    let Some(url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set, using in-memory product store");
        return Ok((Arc::new(InMemoryProductStore::new()), None));
    };

    let pg = PgProductStore::connect(url, config.db_max_connections)
        .await
        .context("failed to connect to Postgres")?;
    pg.ensure_schema()
        .await
        .context("failed to prepare product table")?;
    info!("Postgres product store ready");

    Ok((Arc::new(pg.clone()), Some(pg)))
}

async fn open_cache(
    config: &Config,
    background: &mut Vec<JoinHandle<()>>,
) -> anyhow::Result<CatalogCache> {
    if config.cache_disabled {
        warn!("Cache disabled, every read goes to the store");
        return Ok(CatalogCache::disabled());
    }

    let settings = config.cache_settings();

    let cache = match config.redis_url.as_deref() {
        Some(url) => {
            let backend = RedisBackend::open(
                url,
                Duration::from_millis(config.cache_connect_timeout_ms),
                Duration::from_millis(config.cache_op_timeout_ms),
            )
            .context("invalid REDIS_URL")?;
            CatalogCache::connect(Arc::new(backend), settings).await
        }
        None => {
            let backend = MemoryBackend::new(config.cache_max_entries);
            background.push(spawn_cleanup_task(backend.store(), config.cleanup_interval));
            info!("Background cleanup task started");
            CatalogCache::connect(Arc::new(backend), settings).await
        }
    };

    if cache.is_available() {
        info!("Cache ready");
    } else {
        warn!("Cache unreachable at startup, serving from store until it recovers");
    }
    Ok(cache)
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then aborts background
/// tasks.
async fn shutdown_signal(background: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
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

    for handle in background {
        handle.abort();
    }
    warn!("Background tasks aborted");
}
