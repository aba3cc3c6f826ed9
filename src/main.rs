//! Post Cache - blog post API server with a bounded in-memory cache

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use post_cache::api::create_router;
use post_cache::cache::CacheStore;
use post_cache::posts::{CachedPosts, CachedValue, InMemoryPostRepository, PostRepository};
use post_cache::{AppState, Config, ManagedCache};

/// Main entry point for the post API server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache store and start its sweep task
/// 4. Wire the record store and the cached post layer
/// 5. Pre-cache the newest posts
/// 6. Start HTTP server on configured port
/// 7. On SIGINT/SIGTERM, destroy the cache once and shut down
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "post_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting post cache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, max_memory_mb={}, default_ttl={}ms, sweep_interval={}ms, port={}",
        config.max_entries,
        config.max_memory_mb,
        config.default_ttl_ms,
        config.sweep_interval_ms,
        config.server_port
    );

    let cache = Arc::new(ManagedCache::<CachedValue>::start(CacheStore::new(
        config.cache_limits(),
    )));
    info!("Cache store initialized, sweep task started");

    let repo: Arc<dyn PostRepository> = Arc::new(InMemoryPostRepository::new());
    let posts = CachedPosts::new(repo.clone(), cache.store(), config.read_through_options());

    prewarm_newest(&posts, repo.as_ref(), config.prewarm_count).await;

    let app = create_router(AppState::new(posts));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cache))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Pre-caches the newest posts. Failures only cost warm-up.
async fn prewarm_newest(posts: &CachedPosts, repo: &dyn PostRepository, count: u32) {
    if count == 0 {
        return;
    }

    match repo.list(1, count).await {
        Ok(page) => {
            let slugs: Vec<String> = page.posts.into_iter().map(|post| post.slug).collect();
            let cached = posts.prewarm(&slugs).await;
            info!(cached, requested = slugs.len(), "cache pre-warm finished");
        }
        Err(err) => warn!(error = %err, "cache pre-warm skipped"),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// Destroys the cache exactly once, stopping its sweep task.
async fn shutdown_signal(cache: Arc<ManagedCache<CachedValue>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
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

    cache.destroy().await;
}
