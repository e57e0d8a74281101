//! Stashbox - A uniform caching client over pluggable storage engines
//!
//! Demo server exposing one in-memory cache policy over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stashbox::api::{create_router, AppState};
use stashbox::{Client, Config, MemoryEngine, Policy};

/// Main entry point for the Stashbox cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the memory engine and start a client over it
/// 4. Bind a policy to the configured segment
/// 5. Serve the HTTP API on the configured port
/// 6. Stop the client on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stashbox=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Stashbox Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, max_byte_size={}, default_ttl={}ms, segment={}, port={}, cleanup_interval={}s",
        config.max_entries,
        config.max_byte_size,
        config.default_ttl_ms,
        config.segment,
        config.server_port,
        config.cleanup_interval
    );

    let client = Arc::new(Client::new(MemoryEngine::new(config.memory())));
    client.start().await.context("failed to start cache client")?;

    let policy = Policy::new(config.policy(), client.clone(), config.segment.clone())
        .context("invalid cache policy")?;
    info!("Policy bound to segment '{}'", policy.segment());

    let app = create_router(AppState::new(policy));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    client.stop();
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
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
                warn!("Failed to install SIGTERM handler: {}", err);
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
