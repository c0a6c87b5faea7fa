//! Ports - Abstraction Layer
//!
//! This crate defines ports (traits) that represent the interfaces
//! needed by the application layer. These are implemented by adapters
//! in the infrastructure layer.

pub mod encoder;
pub mod object_store;
pub mod queue;
pub mod runtime;
pub mod telemetry_repository;

pub use crate::encoder::{DatasetEncoder, EncodeError};
pub use crate::object_store::{ObjectInfo, ObjectStore, ObjectStoreError};
pub use crate::queue::{QueueChannel, QueueConnector, QueueError};
pub use crate::runtime::{
    ExecutionRuntime, JOB_ID_ENV, LaunchResult, LaunchSpec, RuntimeError,
};
pub use crate::telemetry_repository::{RepositoryError, TelemetryRepository};
