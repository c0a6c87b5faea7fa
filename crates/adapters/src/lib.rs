//! Adapters - Infrastructure Implementations
//!
//! Implementations of the ports defined in axle-ports: S3/MinIO object
//! storage, NATS JetStream queues, the Docker execution runtime, the Parquet
//! encoder and the PostgreSQL telemetry repository, plus in-memory doubles
//! for each of them.

pub mod codec;
pub mod config;
pub mod logging;
pub mod queue;
pub mod runtime;
pub mod storage;
pub mod telemetry;

pub use crate::codec::ParquetEncoder;
pub use crate::config::{AppConfig, ConfigError, SimulatorConfig};
pub use crate::logging::init_tracing;
pub use crate::queue::{InMemoryQueue, NatsQueueConfig, NatsQueueConnector, QueuedMessage};
pub use crate::runtime::DockerRuntime;
pub use crate::storage::{InMemoryObjectStore, S3ObjectStore};
pub use crate::telemetry::{InMemoryTelemetryRepository, PostgreSqlTelemetryRepository};
