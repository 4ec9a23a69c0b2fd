//! Caching Proxy - A forwarding HTTP proxy with a bounded response cache
//!
//! Usage: `caching_proxy <port>`

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caching_proxy::{spawn_stats_reporter, Config, Dispatcher, ProxyState};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "caching_proxy", about = "Forwarding HTTP proxy with a response cache")]
struct Args {
    /// Port to listen on
    port: u16,
}

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Parse the listening port from the command line
/// 2. Initialize tracing subscriber for logging
/// 3. Load configuration from environment variables
/// 4. Create the shared cache
/// 5. Start background stats report task
/// 6. Bind the listener and accept connections
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Usage errors exit non-zero before anything else starts
    let args = Args::parse();

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caching_proxy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting caching proxy");

    let config = Config::from_env().with_port(args.port);
    info!(
        "Configuration loaded: cache_slots={}, max_object_size={}, stats_interval={}s, listen={}",
        config.cache_slots,
        config.max_object_size,
        config.stats_interval,
        config.listen_addr()
    );

    let state = ProxyState::from_config(&config);
    info!("Cache initialized");

    let report_handle = (config.stats_interval > 0)
        .then(|| spawn_stats_reporter(state.cache.clone(), config.stats_interval));

    let dispatcher = Dispatcher::bind(config.listen_addr(), state)
        .await
        .with_context(|| format!("failed to listen on {}", config.listen_addr()))?;
    info!("Proxy listening on {}", dispatcher.local_addr()?);

    dispatcher.run_until(shutdown_signal(report_handle)).await;

    info!("Proxy shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the stats report task so the dispatcher can
/// stop accepting.
async fn shutdown_signal(report_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    if let Some(handle) = report_handle {
        handle.abort();
        warn!("Stats report task aborted");
    }
}
