//! Innsight Server - Main entry point
//!
//! Serves the reporting pages behind the request gate.

use std::net::SocketAddr;

use innsight_core::{
    app::{self, AppState},
    config::Config,
    middleware::{RequestGate, TokenVerifier},
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration; a missing secret stops start-up here
    let config = match std::env::var("INNSIGHT_CONFIG") {
        Ok(path) => Config::from_file(&path)?,
        Err(_) => Config::load()?,
    };

    let metrics = telemetry::init_telemetry(&config.telemetry())?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        routes = config.gate.routes.entries().len(),
        "Starting Innsight Server"
    );

    let verifier = TokenVerifier::new(&config.auth)?;
    let gate = RequestGate::new(config.gate.clone());
    let app = app::build_router(AppState::new(verifier, gate, metrics));

    let addr: SocketAddr = config.server.bind_address().parse()?;
    tracing::info!(address = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
