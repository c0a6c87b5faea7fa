//! Telemetry Repository Port
//!
//! Read-only access to historical telemetry and maintenance logs.

use async_trait::async_trait;
use axle_core::{DomainError, MaintenanceLog, TelemetryRecord};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),
}

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        DomainError::BackendUnavailable(err.to_string())
    }
}

#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    /// Telemetry rows for a vehicle, ordered by timestamp ascending.
    /// An unknown VIN yields an empty vector.
    async fn telemetry_for_vin(&self, vin: &str) -> Result<Vec<TelemetryRecord>, RepositoryError>;

    /// Maintenance logs for a vehicle, ordered by failure date ascending.
    async fn maintenance_logs_for_vin(
        &self,
        vin: &str,
    ) -> Result<Vec<MaintenanceLog>, RepositoryError>;
}
