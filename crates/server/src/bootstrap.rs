//! Server Bootstrap - Production Initialization

use axle_adapters::config::{AppConfig, ConfigError};
use axle_adapters::{DockerRuntime, PostgreSqlTelemetryRepository};
use axle_application::JobOrchestrator;
use axle_ports::{ExecutionRuntime, TelemetryRepository};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("General error: {0}")]
    General(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BootstrapError>;

#[derive(Clone)]
pub struct ServerComponents {
    pub config: AppConfig,
    pub orchestrator: JobOrchestrator,
    pub telemetry: Arc<dyn TelemetryRepository>,
}

pub async fn initialize_server(config: AppConfig) -> Result<ServerComponents> {
    info!("🚀 Initializing AxleOS simulation server");

    let retry = config.retry.policy();
    let url = config.database.url.as_str();
    let acquire_timeout = Duration::from_millis(config.database.connection_timeout_ms);

    let pool = retry
        .run("connect to PostgreSQL", || {
            PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .acquire_timeout(acquire_timeout)
                .connect(url)
        })
        .await
        .map_err(|e| {
            error!("❌ Failed to connect to PostgreSQL: {}", e);
            BootstrapError::General(anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))
        })?;
    info!("✅ PostgreSQL connection pool initialized");

    let telemetry = PostgreSqlTelemetryRepository::new(pool);
    telemetry.init_schema().await.map_err(|e| {
        error!("❌ Failed to initialize telemetry schema: {}", e);
        BootstrapError::General(anyhow::anyhow!("Failed to initialize telemetry schema: {}", e))
    })?;
    info!("✅ Telemetry repository initialized");

    let runtime = DockerRuntime::connect(config.runtime.docker_socket.as_deref());

    // Launches re-check the daemon, so an unreachable one only degrades jobs.
    match retry.run("ping Docker daemon", || runtime.ping()).await {
        Ok(()) => info!("✅ Docker daemon reachable"),
        Err(e) => warn!("⚠️  Docker daemon unreachable, jobs will fail to start: {}", e),
    }

    if config.runtime.host_path.is_none() {
        warn!("⚠️  AXLE_RUNTIME_HOST_PATH is not set, every launch will be rejected");
    }

    let orchestrator = JobOrchestrator::new(Arc::new(runtime), config.launch_spec());
    info!("✅ Job orchestrator initialized");

    Ok(ServerComponents {
        config,
        orchestrator,
        telemetry: Arc::new(telemetry),
    })
}

pub fn log_config_summary(config: &AppConfig) {
    info!("📋 Configuration Summary:");
    info!(
        "   Database: {} (max_conn: {})",
        mask_url(&config.database.url),
        config.database.max_connections
    );
    info!("   Server: {}:{}", config.server.host, config.server.port);
    info!(
        "   Runtime: image={} network={} mount={}",
        config.runtime.image, config.runtime.network, config.runtime.mount_target
    );
    info!(
        "   Worker storage: {} bucket={}",
        config.runtime.worker_storage_endpoint, config.storage.bucket
    );
    info!(
        "   Worker queue: {} queue={} format={}",
        mask_url(&config.runtime.worker_queue_url),
        config.queue.name,
        config.queue.message_format
    );
}

/// Hide the password part of a connection URL
fn mask_url(url: &str) -> String {
    let Some(pos) = url.find("://") else {
        return url.to_string();
    };
    let (scheme, rest) = url.split_at(pos + 3);

    let Some(at_pos) = rest.rfind('@') else {
        return url.to_string();
    };
    let (creds, host) = rest.split_at(at_pos);

    match creds.split_once(':') {
        Some((user, _)) => format!("{}{}:****{}", scheme, user, host),
        None => format!("{}{}{}", scheme, creds, host),
    }
}
