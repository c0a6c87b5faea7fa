//! Execution Runtime Port
//!
//! Launches one isolated, single-use execution environment per job. Launch is
//! fire-and-forget: a runtime may report the environment's exit when it ran
//! the workload inline, but is never required to supervise it.

use async_trait::async_trait;
use axle_core::{DomainError, ExitInfo, JobId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Network modes that would expose the workload beyond the private service
/// network.
const FORBIDDEN_NETWORKS: &[&str] = &["host", "bridge", "default"];

/// Runtime error types
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Invalid launch configuration: {0}")]
    Configuration(String),

    #[error("Execution runtime unreachable: {0}")]
    Unavailable(String),

    #[error("Failed to launch environment: {0}")]
    Launch(String),
}

impl From<RuntimeError> for DomainError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Configuration(msg) => DomainError::Configuration(msg),
            RuntimeError::Unavailable(msg) => DomainError::BackendUnavailable(msg),
            RuntimeError::Launch(msg) => DomainError::BackendUnavailable(msg),
        }
    }
}

/// Everything a runtime needs to start a simulation environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// Image the environment runs
    pub image: String,
    /// Host directory bind-mounted read-only into the environment
    pub host_path: Option<PathBuf>,
    /// Mount point of `host_path` inside the environment
    pub mount_target: String,
    /// Private network shared with the object store and the queue
    pub network: String,
    /// Variables injected into the environment (endpoints, bucket, queue)
    pub environment: BTreeMap<String, String>,
}

impl LaunchSpec {
    /// Resolve the mandatory host path, failing before any launch attempt.
    pub fn resolve_host_path(&self) -> Result<&PathBuf, RuntimeError> {
        match &self.host_path {
            Some(path) if !path.as_os_str().is_empty() => Ok(path),
            _ => Err(RuntimeError::Configuration(
                "simulator host path is not set (AXLE_RUNTIME_HOST_PATH)".to_string(),
            )),
        }
    }

    /// Ensure the environment is attached to a private network only.
    pub fn validate_network(&self) -> Result<&str, RuntimeError> {
        let network = self.network.trim();
        if network.is_empty() {
            return Err(RuntimeError::Configuration(
                "runtime network is not set (AXLE_RUNTIME_NETWORK)".to_string(),
            ));
        }
        if FORBIDDEN_NETWORKS.contains(&network) {
            return Err(RuntimeError::Configuration(format!(
                "network '{}' is not a private service network",
                network
            )));
        }
        Ok(network)
    }

    /// Read-only bind in `host:target:ro` form
    pub fn read_only_bind(&self) -> Result<String, RuntimeError> {
        let host = self.resolve_host_path()?;
        Ok(format!("{}:{}:ro", host.display(), self.mount_target))
    }

    /// Environment variables for one job, `KEY=value` formatted
    pub fn env_for(&self, job_id: &JobId) -> Vec<String> {
        let mut env: Vec<String> = self
            .environment
            .iter()
            .filter(|(key, _)| key.as_str() != JOB_ID_ENV)
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        env.push(format!("{}={}", JOB_ID_ENV, job_id));
        env
    }
}

/// Name of the variable carrying the job id into the environment
pub const JOB_ID_ENV: &str = "AXLE_JOB_ID";

/// Outcome of a successful launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchResult {
    pub environment_id: String,
    /// Present only when the runtime observed the environment's exit
    pub exit: Option<ExitInfo>,
}

/// Execution runtime port trait
#[async_trait]
pub trait ExecutionRuntime: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Connectivity handshake with the runtime
    async fn ping(&self) -> Result<(), RuntimeError>;

    async fn launch(&self, job_id: &JobId, spec: &LaunchSpec)
    -> Result<LaunchResult, RuntimeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> LaunchSpec {
        LaunchSpec {
            image: "simulator:latest".to_string(),
            host_path: Some(PathBuf::from("/opt/beamng")),
            mount_target: "/app/BeamNG.tech".to_string(),
            network: "infrastructure_default".to_string(),
            environment: BTreeMap::from([
                (
                    "AXLE_STORAGE_ENDPOINT".to_string(),
                    "http://minio:9000".to_string(),
                ),
                ("AXLE_QUEUE_URL".to_string(), "nats://nats:4222".to_string()),
            ]),
        }
    }

    #[test]
    fn test_missing_host_path_is_configuration_error() {
        let mut spec = spec();
        spec.host_path = None;
        assert!(matches!(
            spec.resolve_host_path(),
            Err(RuntimeError::Configuration(_))
        ));

        spec.host_path = Some(PathBuf::new());
        assert!(matches!(
            spec.read_only_bind(),
            Err(RuntimeError::Configuration(_))
        ));
    }

    #[test]
    fn test_read_only_bind_format() {
        assert_eq!(
            spec().read_only_bind().unwrap(),
            "/opt/beamng:/app/BeamNG.tech:ro"
        );
    }

    #[test]
    fn test_public_networks_are_rejected() {
        let mut spec = spec();
        assert_eq!(spec.validate_network().unwrap(), "infrastructure_default");

        for network in ["host", "bridge", "default", "  "] {
            spec.network = network.to_string();
            assert!(spec.validate_network().is_err(), "{} accepted", network);
        }
    }

    #[test]
    fn test_env_includes_job_id_once() {
        let mut spec = spec();
        spec.environment
            .insert(JOB_ID_ENV.to_string(), "stale".to_string());
        let job_id = JobId::new();

        let env = spec.env_for(&job_id);
        let job_vars: Vec<_> = env.iter().filter(|e| e.starts_with("AXLE_JOB_ID=")).collect();
        assert_eq!(job_vars.len(), 1);
        assert_eq!(job_vars[0], &format!("AXLE_JOB_ID={}", job_id));
        assert!(env.contains(&"AXLE_QUEUE_URL=nats://nats:4222".to_string()));
    }
}
