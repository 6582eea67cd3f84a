//! SSR Cache - a caching front door for a server-side rendering backend
//!
//! Binary entry point: wires configuration, logging, the upstream renderer and
//! the HTTP server together.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};

use ssr_cache::render::UpstreamRenderer;
use ssr_cache::telemetry::init_tracing;
use ssr_cache::{create_router, spawn_cleanup_task, AppState, Config};

/// Main entry point for the SSR cache server.
///
/// # Startup Sequence
/// 1. Load configuration from environment variables
/// 2. Initialize tracing subscriber for logging
/// 3. Build the upstream renderer and application state
/// 4. Start background TTL sweep task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(config.log_format).context("failed to install tracing subscriber")?;

    info!(
        port = config.server_port,
        ttl_secs = config.cache_ttl,
        check_period_secs = config.check_period,
        max_entries = config.max_entries,
        static_dir = %config.static_dir.display(),
        document = %config.document_path.display(),
        upstream = %config.render_upstream,
        "Configuration loaded"
    );

    if config.admin_token.is_none() {
        warn!("ADMIN_TOKEN is not set, POST /api/cache-clear is open to anyone");
    }

    let renderer = UpstreamRenderer::new(config.render_upstream.clone(), config.render_timeout())
        .context("failed to build upstream renderer")?;

    let state = AppState::from_config(&config, Arc::new(renderer));

    let cleanup_handle = spawn_cleanup_task(state.store(), config.sweep_interval());

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(url = %format!("http://localhost:{}", config.server_port), "Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweep task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
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
                warn!(error = %err, "Failed to install SIGTERM handler");
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

    cleanup_handle.abort();
    warn!("TTL sweep task aborted");
}
