//! Unified Application Configuration
//!
//! Every value is injected from the environment (or a YAML document); the
//! defaults below match the compose deployment, while credentials and the
//! database URL have no defaults at all.

use axle_core::{JobId, NotificationFormat, RetryPolicy};
use axle_ports::LaunchSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Orchestrator / query server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Telemetry database configuration
    pub database: DatabaseConfig,

    /// Execution runtime configuration
    pub runtime: RuntimeConfig,

    /// Object store settings forwarded to launched environments
    pub storage: StorageConfig,

    /// Queue settings forwarded to launched environments
    pub queue: QueueConfig,

    /// Startup connectivity retry
    pub retry: RetryConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file, inline YAML, or the environment
    pub fn load() -> Result<Self> {
        let config: Self = match (
            std::env::var("AXLE_CONFIG_PATH").ok(),
            std::env::var("AXLE_CONFIG_YAML").ok(),
        ) {
            (Some(path), None) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    return Err(ConfigError::FileNotFound(path));
                }
                let content = std::fs::read_to_string(&path).map_err(ConfigError::FileRead)?;
                serde_yaml::from_str(&content).map_err(ConfigError::ParseYaml)?
            }
            (None, Some(yaml)) => serde_yaml::from_str(&yaml).map_err(ConfigError::ParseYaml)?,
            _ => Self::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            runtime: RuntimeConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            queue: QueueConfig::from_env()?,
            retry: RetryConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.database.validate()?;
        self.storage.validate()?;
        self.queue.validate()?;
        self.retry.validate()?;
        if self.runtime.worker_operation_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "worker_operation_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Launch specification for simulation environments.
    ///
    /// Endpoints are the ones reachable from inside the runtime network, not
    /// the ones this process uses.
    pub fn launch_spec(&self) -> LaunchSpec {
        let mut environment = BTreeMap::new();
        environment.insert(
            "AXLE_STORAGE_ENDPOINT".to_string(),
            self.runtime.worker_storage_endpoint.clone(),
        );
        environment.insert(
            "AXLE_STORAGE_BUCKET".to_string(),
            self.storage.bucket.clone(),
        );
        environment.insert(
            "AXLE_STORAGE_REGION".to_string(),
            self.storage.region.clone(),
        );
        environment.insert(
            "AXLE_STORAGE_ACCESS_KEY".to_string(),
            self.storage.access_key.clone(),
        );
        environment.insert(
            "AXLE_STORAGE_SECRET_KEY".to_string(),
            self.storage.secret_key.clone(),
        );
        environment.insert(
            "AXLE_QUEUE_URL".to_string(),
            self.runtime.worker_queue_url.clone(),
        );
        environment.insert("AXLE_QUEUE_NAME".to_string(), self.queue.name.clone());
        environment.insert(
            "AXLE_MESSAGE_FORMAT".to_string(),
            self.queue.message_format.to_string(),
        );
        environment.insert(
            "AXLE_STORAGE_TIMEOUT_MS".to_string(),
            self.storage.timeout_ms.to_string(),
        );
        environment.insert(
            "AXLE_QUEUE_TIMEOUT_MS".to_string(),
            self.queue.connection_timeout_ms.to_string(),
        );
        environment.insert(
            "AXLE_OPERATION_TIMEOUT_MS".to_string(),
            self.runtime.worker_operation_timeout_ms.to_string(),
        );
        environment.insert(
            "AXLE_RETRY_MAX_ATTEMPTS".to_string(),
            self.retry.max_attempts.to_string(),
        );
        environment.insert(
            "AXLE_RETRY_DELAY_MS".to_string(),
            self.retry.delay_ms.to_string(),
        );
        environment.insert("AXLE_LOG_LEVEL".to_string(), self.logging.level.clone());
        environment.insert("AXLE_LOG_FORMAT".to_string(), self.logging.format.clone());

        LaunchSpec {
            image: self.runtime.image.clone(),
            host_path: self.runtime.host_path.clone(),
            mount_target: self.runtime.mount_target.clone(),
            network: self.runtime.network.clone(),
            environment,
        }
    }
}

/// Configuration of the simulator binary running inside an environment
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulatorConfig {
    pub job_id: JobId,
    pub storage: StorageConfig,
    pub queue: QueueConfig,
    pub retry: RetryConfig,
    /// Upper bound for each store/queue operation, in milliseconds
    pub operation_timeout_ms: u64,
    pub logging: LoggingConfig,
}

impl SimulatorConfig {
    pub fn from_env() -> Result<Self> {
        let raw_job_id = required("AXLE_JOB_ID")?;
        let job_id = JobId::parse(&raw_job_id)
            .map_err(|_| ConfigError::InvalidValue("AXLE_JOB_ID".to_string()))?;

        let config = Self {
            job_id,
            storage: StorageConfig::from_env()?,
            queue: QueueConfig::from_env()?,
            retry: RetryConfig::from_env()?,
            operation_timeout_ms: parsed("AXLE_OPERATION_TIMEOUT_MS", "30000")?,
            logging: LoggingConfig::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.storage.validate()?;
        self.queue.validate()?;
        self.retry.validate()?;
        if self.operation_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "operation_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: parsed("AXLE_PORT", "8000")?,
            host: optional("AXLE_HOST", "0.0.0.0"),
        })
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections
    pub max_connections: u32,

    /// Connection timeout in milliseconds
    pub connection_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: required("AXLE_DB_URL")?,
            max_connections: parsed("AXLE_DB_MAX_CONNECTIONS", "10")?,
            connection_timeout_ms: parsed("AXLE_DB_TIMEOUT_MS", "5000")?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "max_connections must be > 0".to_string(),
            ));
        }
        if !(self.url.starts_with("postgres://") || self.url.starts_with("postgresql://")) {
            return Err(ConfigError::InvalidValue(
                "database URL must be PostgreSQL".to_string(),
            ));
        }
        Ok(())
    }
}

/// Object store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// S3-compatible endpoint
    pub endpoint: String,

    pub access_key: String,

    #[serde(skip_serializing)]
    pub secret_key: String,

    /// Bucket receiving simulation artifacts
    pub bucket: String,

    pub region: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            endpoint: optional("AXLE_STORAGE_ENDPOINT", "http://minio:9000"),
            access_key: required("AXLE_STORAGE_ACCESS_KEY")?,
            secret_key: required("AXLE_STORAGE_SECRET_KEY")?,
            bucket: optional("AXLE_STORAGE_BUCKET", "raw-telemetry"),
            region: optional("AXLE_STORAGE_REGION", "us-east-1"),
            timeout_ms: parsed("AXLE_STORAGE_TIMEOUT_MS", "30000")?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "storage endpoint must be an http(s) URL".to_string(),
            ));
        }
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "storage bucket must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Queue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Broker URL
    pub url: String,

    /// Queue receiving completion notifications
    pub name: String,

    /// Connection timeout in milliseconds
    pub connection_timeout_ms: u64,

    /// Notification body layout
    pub message_format: NotificationFormat,
}

impl QueueConfig {
    pub fn from_env() -> Result<Self> {
        let message_format = NotificationFormat::from_str(&optional(
            "AXLE_MESSAGE_FORMAT",
            "structured",
        ))
        .map_err(|_| ConfigError::InvalidValue("AXLE_MESSAGE_FORMAT".to_string()))?;

        Ok(Self {
            url: optional("AXLE_QUEUE_URL", "nats://nats:4222"),
            name: optional("AXLE_QUEUE_NAME", "data_ready"),
            connection_timeout_ms: parsed("AXLE_QUEUE_TIMEOUT_MS", "5000")?,
            message_format,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.url.starts_with("nats://") && !self.url.starts_with("tls://") {
            return Err(ConfigError::InvalidValue(
                "queue URL must use nats:// or tls://".to_string(),
            ));
        }
        if self.name.is_empty()
            || self
                .name
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '.' | '*' | '>'))
        {
            return Err(ConfigError::InvalidValue(format!(
                "invalid queue name '{}'",
                self.name
            )));
        }
        Ok(())
    }
}

/// Execution runtime configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuntimeConfig {
    /// Docker socket path; platform default when absent
    pub docker_socket: Option<String>,

    /// Simulator image
    pub image: String,

    /// Host directory mounted read-only into each environment.
    /// Checked at launch time, not at startup.
    pub host_path: Option<PathBuf>,

    pub mount_target: String,

    /// Private network shared with storage and queue
    pub network: String,

    /// Object store endpoint as seen from inside the network
    pub worker_storage_endpoint: String,

    /// Queue URL as seen from inside the network
    pub worker_queue_url: String,

    /// Per-operation bound handed to each simulation worker
    #[serde(default = "default_worker_operation_timeout_ms")]
    pub worker_operation_timeout_ms: u64,
}

fn default_worker_operation_timeout_ms() -> u64 {
    30_000
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            docker_socket: std::env::var("AXLE_DOCKER_SOCKET").ok(),
            image: optional("AXLE_RUNTIME_IMAGE", "simulator:latest"),
            host_path: std::env::var("AXLE_RUNTIME_HOST_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            mount_target: optional("AXLE_RUNTIME_MOUNT_TARGET", "/app/BeamNG.tech"),
            network: optional("AXLE_RUNTIME_NETWORK", "infrastructure_default"),
            worker_storage_endpoint: optional("AXLE_WORKER_STORAGE_ENDPOINT", "http://minio:9000"),
            worker_queue_url: optional("AXLE_WORKER_QUEUE_URL", "nats://nats:4222"),
            worker_operation_timeout_ms: parsed("AXLE_OPERATION_TIMEOUT_MS", "30000")?,
        })
    }
}

/// Startup connectivity retry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl RetryConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            max_attempts: parsed("AXLE_RETRY_MAX_ATTEMPTS", "5")?,
            delay_ms: parsed("AXLE_RETRY_DELAY_MS", "5000")?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "max_attempts must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.max_attempts, Duration::from_millis(self.delay_ms))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,

    /// Log format
    pub format: String,
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            level: optional("AXLE_LOG_LEVEL", "info"),
            format: optional("AXLE_LOG_FORMAT", "json"),
        })
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

fn optional(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn required(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(var.to_string())),
    }
}

fn parsed<T: FromStr>(var: &str, default: &str) -> Result<T> {
    optional(var, default)
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(var.to_string()))
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    FileRead(std::io::Error),

    #[error("Failed to parse YAML configuration: {0}")]
    ParseYaml(serde_yaml::Error),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
