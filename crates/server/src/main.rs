//! AxleOS Server - Production Bootstrap

use anyhow::Context;
use axle_adapters::config::AppConfig;
use axle_adapters::init_tracing;
use axle_server::api_router::create_api_router;
use axle_server::bootstrap::{initialize_server, log_config_summary};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);
    info!("🚀 Starting AxleOS Server");

    log_config_summary(&config);

    let components = initialize_server(config).await.map_err(|e| {
        error!("❌ Failed to initialize server: {}", e);
        e
    })?;

    let host = components.config.server.host.clone();
    let port = components.config.server.port;

    info!("🌐 Setting up HTTP routes...");
    let app = create_api_router(components.orchestrator.clone(), components.telemetry.clone());

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    info!("✅ Server listening on http://{}:{}", host, port);

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!("❌ HTTP server error: {}", e);
                return Err(e.into());
            }
            info!("🔄 HTTP server stopped");
        }
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("🛑 Received Ctrl-C, initiating graceful shutdown..."),
                Err(e) => error!("Failed to listen for Ctrl-C signal: {}", e),
            }
            info!(
                in_flight = components.orchestrator.in_flight(),
                "🧹 Abandoning pending launches"
            );
        }
    }

    info!("✅ Server shutdown complete");
    Ok(())
}
