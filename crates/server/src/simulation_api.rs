//! Simulation REST API Module
//!
//! Accepts simulation requests and hands them to the Job Orchestrator. The
//! response goes out as soon as the job is registered; the launch itself
//! happens in the background.

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use axle_application::{HealthStatus, JobOrchestrator};
use axle_core::{JobId, JobRecord, JobRequest};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};

pub const ACCEPTED_MESSAGE: &str = "Simulation run has been triggered in the background.";

#[derive(Clone)]
pub struct SimulationApiAppState {
    pub orchestrator: JobOrchestrator,
}

impl SimulationApiAppState {
    pub fn new(orchestrator: JobOrchestrator) -> Self {
        Self { orchestrator }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationAcceptedDto {
    pub message: String,
    pub job_id: JobId,
}

/// An absent body and `null` both mean "no parameters"; any JSON object is
/// carried on the request as-is.
pub fn parse_job_request(body: &[u8]) -> ApiResult<JobRequest> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(JobRequest::empty());
    }

    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    match value {
        serde_json::Value::Null => Ok(JobRequest::empty()),
        serde_json::Value::Object(map) => Ok(JobRequest {
            parameters: map.into_iter().collect(),
        }),
        _ => Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

pub async fn submit_simulation_handler(
    State(state): State<SimulationApiAppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<SimulationAcceptedDto>)> {
    let request = parse_job_request(&body).inspect_err(|e| {
        warn!(error = %e, "Rejected simulation request");
    })?;

    let job_id = state.orchestrator.submit(request);
    info!(job_id = %job_id, "Simulation run triggered");

    Ok((
        StatusCode::ACCEPTED,
        Json(SimulationAcceptedDto {
            message: ACCEPTED_MESSAGE.to_string(),
            job_id,
        }),
    ))
}

pub async fn get_simulation_handler(
    State(state): State<SimulationApiAppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobRecord>> {
    let job_id =
        JobId::parse(&job_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    match state.orchestrator.status(&job_id) {
        Some(record) => Ok(Json(record)),
        None => {
            warn!(job_id = %job_id, "Simulation job not found");
            Err(ApiError::NotFound("Simulation job not found".to_string()))
        }
    }
}

pub async fn health_handler(State(state): State<SimulationApiAppState>) -> Json<HealthStatus> {
    Json(state.orchestrator.health())
}

pub fn simulation_api_routes(state: SimulationApiAppState) -> Router {
    Router::new()
        .route("/simulations", post(submit_simulation_handler))
        .route("/simulations/{job_id}", get(get_simulation_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}
