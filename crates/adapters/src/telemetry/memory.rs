//! In-memory telemetry repository

use async_trait::async_trait;
use axle_core::{MaintenanceLog, TelemetryRecord};
use axle_ports::{RepositoryError, TelemetryRepository};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct InMemoryTelemetryRepository {
    telemetry: Arc<DashMap<String, Vec<TelemetryRecord>>>,
    maintenance: Arc<DashMap<String, Vec<MaintenanceLog>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryTelemetryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_telemetry(&self, record: TelemetryRecord) {
        let mut rows = self
            .telemetry
            .entry(record.vehicle_vin.clone())
            .or_default();
        rows.push(record);
        rows.sort_by_key(|r| r.timestamp);
    }

    pub fn insert_maintenance_log(&self, log: MaintenanceLog) {
        let mut rows = self.maintenance.entry(log.vehicle_vin.clone()).or_default();
        rows.push(log);
        rows.sort_by_key(|l| l.failure_date);
    }

    /// Make every query fail as if the database were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TelemetryRepository for InMemoryTelemetryRepository {
    async fn telemetry_for_vin(&self, vin: &str) -> Result<Vec<TelemetryRecord>, RepositoryError> {
        self.ensure_available()?;
        Ok(self
            .telemetry
            .get(vin)
            .map(|rows| rows.clone())
            .unwrap_or_default())
    }

    async fn maintenance_logs_for_vin(
        &self,
        vin: &str,
    ) -> Result<Vec<MaintenanceLog>, RepositoryError> {
        self.ensure_available()?;
        Ok(self
            .maintenance
            .get(vin)
            .map(|rows| rows.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(vin: &str, second: u32) -> TelemetryRecord {
        TelemetryRecord {
            vehicle_vin: vin.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, second).unwrap(),
            odometer: 1000,
            speed: 10.0,
            rpm: 900.0,
            throttle: 0.1,
            engine_coolant_temp: 90.0,
            engine_load: 0.3,
            fuel_trim: 0.0,
            battery_voltage: 12.6,
            ambient_air_temp: 20.0,
        }
    }

    #[tokio::test]
    async fn test_rows_come_back_in_timestamp_order() {
        let repo = InMemoryTelemetryRepository::new();
        repo.insert_telemetry(record("VIN1", 30));
        repo.insert_telemetry(record("VIN1", 10));
        repo.insert_telemetry(record("VIN2", 5));

        let rows = repo.telemetry_for_vin("VIN1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].timestamp < rows[1].timestamp);
        assert!(repo.telemetry_for_vin("VIN3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_backend() {
        let repo = InMemoryTelemetryRepository::new();
        repo.set_unavailable(true);
        assert!(matches!(
            repo.maintenance_logs_for_vin("VIN1").await,
            Err(RepositoryError::Unavailable(_))
        ));
    }
}
