//! Telematics REST API Module
//!
//! Read-only access to historical telemetry and maintenance logs per vehicle.

use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::get,
};
use axle_core::{MaintenanceLog, TelemetryRecord};
use axle_ports::TelemetryRepository;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct TelematicsApiAppState {
    pub repository: Arc<dyn TelemetryRepository>,
}

impl TelematicsApiAppState {
    pub fn new(repository: Arc<dyn TelemetryRepository>) -> Self {
        Self { repository }
    }
}

pub async fn get_telemetry_handler(
    State(state): State<TelematicsApiAppState>,
    Path(vin): Path<String>,
) -> ApiResult<Json<Vec<TelemetryRecord>>> {
    match state.repository.telemetry_for_vin(&vin).await {
        Ok(rows) if rows.is_empty() => {
            warn!(vin = %vin, "No telemetry for vehicle");
            Err(ApiError::NotFound("Vehicle VIN not found".to_string()))
        }
        Ok(rows) => {
            info!(vin = %vin, rows = rows.len(), "Telemetry retrieved");
            Ok(Json(rows))
        }
        Err(e) => {
            error!(vin = %vin, error = %e, "Failed to query telemetry");
            Err(ApiError::Internal(e.to_string()))
        }
    }
}

pub async fn get_maintenance_logs_handler(
    State(state): State<TelematicsApiAppState>,
    Path(vin): Path<String>,
) -> ApiResult<Json<Vec<MaintenanceLog>>> {
    match state.repository.maintenance_logs_for_vin(&vin).await {
        Ok(logs) if logs.is_empty() => {
            warn!(vin = %vin, "No maintenance logs for vehicle");
            Err(ApiError::NotFound("No maintenance logs found.".to_string()))
        }
        Ok(logs) => {
            info!(vin = %vin, logs = logs.len(), "Maintenance logs retrieved");
            Ok(Json(logs))
        }
        Err(e) => {
            error!(vin = %vin, error = %e, "Failed to query maintenance logs");
            Err(ApiError::Internal(format!("Database error: {}", e)))
        }
    }
}

pub fn telematics_api_routes(state: TelematicsApiAppState) -> Router {
    Router::new()
        .route("/telemetry/{vin}", get(get_telemetry_handler))
        .route("/maintenance_logs/{vin}", get(get_maintenance_logs_handler))
        .with_state(state)
}
