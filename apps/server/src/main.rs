//! JSON-RPC server binary.

use anyhow::Context as _;
use rpc_server::{create_app, create_dispatcher, init_tracing, AppState, ServerConfig};
use tokio::{net::TcpListener, signal};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    init_tracing(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        dump_errors = config.dump_errors,
        "Starting RPC server"
    );

    // Registration completes here, before any request is served
    let dispatcher = create_dispatcher(&config).context("Failed to register methods")?;
    info!(methods = ?dispatcher.registry().method_names(), "Registered methods");

    let addr = config.socket_addr()?;
    let app = create_app(AppState::new(config, dispatcher))?;

    // Bind and serve
    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
