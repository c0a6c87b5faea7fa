//! Docker Execution Runtime
//!
//! Starts one detached simulator container per job via bollard-next. The
//! container joins the private service network, mounts the simulator assets
//! read-only, and is removed by the daemon once it exits.

use async_trait::async_trait;
use axle_core::JobId;
use axle_ports::{ExecutionRuntime, LaunchResult, LaunchSpec, RuntimeError};
use bollard_next::Docker;
use bollard_next::container::{Config, CreateContainerOptions, StartContainerOptions};
use bollard_next::service::HostConfig;
use std::collections::HashMap;
use tracing::{info, warn};

/// Seconds bollard waits on a single daemon request
const DOCKER_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct DockerRuntime {
    /// Client, or the reason it could not be built
    docker: Result<Docker, String>,
}

impl DockerRuntime {
    /// Build a client for the daemon at `socket`, or the platform default
    /// when absent.
    ///
    /// A missing socket does not fail here; every `ping` and `launch`
    /// reports it as `Unavailable` so the caller can keep serving.
    pub fn connect(socket: Option<&str>) -> Self {
        let docker = match socket {
            Some(path) => Docker::connect_with_socket(
                path,
                DOCKER_REQUEST_TIMEOUT_SECS,
                bollard_next::API_DEFAULT_VERSION,
            ),
            #[cfg(unix)]
            None => Docker::connect_with_socket_defaults(),
            #[cfg(windows)]
            None => Docker::connect_with_local_defaults(),
        }
        .map_err(|e| format!("Failed to connect to Docker: {}", e));

        match &docker {
            Ok(_) => info!("Docker runtime initialized with bollard-next client"),
            Err(e) => warn!(error = %e, "Docker client unavailable, launches will fail"),
        }
        Self { docker }
    }

    fn client(&self) -> Result<&Docker, RuntimeError> {
        self.docker
            .as_ref()
            .map_err(|e| RuntimeError::Unavailable(e.clone()))
    }

    pub fn container_name(job_id: &JobId) -> String {
        format!("axle-simulation-{}", job_id)
    }

    fn container_config(job_id: &JobId, spec: &LaunchSpec) -> Result<Config, RuntimeError> {
        let bind = spec.read_only_bind()?;
        let network = spec.validate_network()?;

        let mut labels = HashMap::new();
        labels.insert("axle.simulation".to_string(), "true".to_string());
        labels.insert("axle.simulation.job_id".to_string(), job_id.to_string());

        Ok(Config {
            image: Some(spec.image.clone()),
            env: Some(spec.env_for(job_id)),
            labels: Some(labels),
            host_config: Some(HostConfig {
                binds: Some(vec![bind]),
                network_mode: Some(network.to_string()),
                auto_remove: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

#[async_trait]
impl ExecutionRuntime for DockerRuntime {
    fn name(&self) -> &str {
        "docker"
    }

    async fn ping(&self) -> Result<(), RuntimeError> {
        self.client()?
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| RuntimeError::Unavailable(format!("Docker daemon unreachable: {}", e)))
    }

    async fn launch(
        &self,
        job_id: &JobId,
        spec: &LaunchSpec,
    ) -> Result<LaunchResult, RuntimeError> {
        // Configuration problems must surface before the daemon is touched.
        let container_config = Self::container_config(job_id, spec)?;
        let container_name = Self::container_name(job_id);

        self.ping().await?;
        let docker = self.client()?;

        let create_options = CreateContainerOptions {
            name: container_name.clone(),
            ..Default::default()
        };

        let created = docker
            .create_container(Some(create_options), container_config)
            .await
            .map_err(|e| {
                RuntimeError::Launch(format!(
                    "Failed to create container '{}': {}",
                    container_name, e
                ))
            })?;

        docker
            .start_container::<&str>(&container_name, Some(StartContainerOptions::default()))
            .await
            .map_err(|e| {
                RuntimeError::Launch(format!(
                    "Failed to start container '{}': {}",
                    container_name, e
                ))
            })?;

        info!(
            job_id = %job_id,
            container = %container_name,
            container_id = %created.id,
            image = %spec.image,
            network = %spec.network,
            "Simulation container started"
        );

        Ok(LaunchResult {
            environment_id: created.id,
            exit: None,
        })
    }
}
