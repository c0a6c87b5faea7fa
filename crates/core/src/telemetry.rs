//! Telemetry data shapes
//!
//! `TelemetryFrame` is the dataset a simulation run produces. `TelemetryRecord`
//! and `MaintenanceLog` are the historical rows served by the query API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sample emitted by the simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Seconds since the start of the run
    pub timestamp: f64,
    pub speed: i64,
    pub rpm: i64,
    pub throttle: f64,
}

/// In-memory dataset produced by one simulation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub samples: Vec<TelemetrySample>,
}

impl TelemetryFrame {
    pub fn new(samples: Vec<TelemetrySample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.timestamp)
    }
}

/// Historical telemetry row for a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TelemetryRecord {
    pub vehicle_vin: String,
    pub timestamp: DateTime<Utc>,
    pub odometer: i64,
    pub speed: f64,
    pub rpm: f64,
    pub throttle: f64,
    pub engine_coolant_temp: f64,
    pub engine_load: f64,
    pub fuel_trim: f64,
    pub battery_voltage: f64,
    pub ambient_air_temp: f64,
}

/// Recorded component failure for a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MaintenanceLog {
    pub vehicle_vin: String,
    pub failure_date: DateTime<Utc>,
    pub odometer_at_failure: i64,
    pub failed_component: String,
    pub failure_notes: Option<String>,
}
