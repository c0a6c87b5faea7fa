//! AxleOS Simulator - one simulation run per process
//!
//! Reads its job id and connection settings from the environment, produces
//! the dataset, uploads it and announces it. The exit code reports the
//! outcome to the execution runtime.

use anyhow::Context;
use axle_adapters::config::SimulatorConfig;
use axle_adapters::{
    NatsQueueConfig, NatsQueueConnector, ParquetEncoder, S3ObjectStore, init_tracing,
};
use axle_application::{SampleTelemetrySource, SimulationWorker, WorkerSettings};
use axle_ports::{ObjectStore, QueueConnector};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = SimulatorConfig::from_env().context("Failed to load simulator configuration")?;
    init_tracing(&config.logging);

    let job_id = config.job_id;
    info!(job_id = %job_id, "🚀 Starting simulation worker");

    let retry = config.retry.policy();

    let store = S3ObjectStore::new(&config.storage);
    retry
        .run("reach object store bucket", || {
            store.check_bucket(&config.storage.bucket)
        })
        .await
        .with_context(|| format!("Object store unreachable at {}", store.endpoint()))?;
    info!(bucket = %config.storage.bucket, "✅ Object store reachable");

    let connector = NatsQueueConnector::new(NatsQueueConfig::from(&config.queue))
        .with_request_timeout(config.operation_timeout());
    let probe = retry
        .run("connect to queue broker", || connector.connect())
        .await
        .with_context(|| format!("Queue broker unreachable at {}", config.queue.url))?;
    if let Err(e) = probe.close().await {
        warn!(error = %e, "Failed to close probe connection");
    }
    info!(queue = %config.queue.name, "✅ Queue broker reachable");

    let worker = SimulationWorker::new(
        Arc::new(SampleTelemetrySource::new()),
        Arc::new(ParquetEncoder::new()),
        Arc::new(store),
        Arc::new(connector),
        WorkerSettings {
            bucket: config.storage.bucket.clone(),
            queue_name: config.queue.name.clone(),
            format: config.queue.message_format,
            operation_timeout: config.operation_timeout(),
        },
    );

    let report = worker.run(job_id).await;
    match &report.outcome {
        Ok(notification) => {
            info!(
                job_id = %job_id,
                object_key = %notification.object_key,
                "✅ Simulation run complete"
            );
        }
        Err(e) => {
            error!(
                job_id = %job_id,
                stage = %report.final_stage(),
                error = %e,
                "❌ Simulation run failed"
            );
        }
    }

    Ok(ExitCode::from(report.exit_code() as u8))
}
