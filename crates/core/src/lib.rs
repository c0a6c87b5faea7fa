//! Domain Core - Simulation pipeline types
//!
//! Job identity and lifecycle, artifact layout, completion notifications,
//! telemetry shapes, the error taxonomy and the shared retry policy.

pub mod artifact;
pub mod error;
pub mod job;
pub mod retry;
pub mod telemetry;

pub use crate::artifact::{
    ARTIFACT_PREFIX, ArtifactFormat, CompletionNotification, NOTIFICATION_SCHEMA_VERSION,
    NotificationFormat, SimulationArtifact, artifact_key,
};
pub use crate::error::DomainError;
pub use crate::job::{ExitInfo, JobId, JobRecord, JobRequest, JobState, LifecycleEvent};
pub use crate::retry::{Backoff, RetryPolicy};
pub use crate::telemetry::{MaintenanceLog, TelemetryFrame, TelemetryRecord, TelemetrySample};
pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;

// Domain result type
pub type Result<T> = std::result::Result<T, DomainError>;
