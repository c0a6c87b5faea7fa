//! Centralized API Router
//!
//! Single point of entry for all routes, used by the binary and by the
//! integration tests.

use axle_application::JobOrchestrator;
use axle_ports::TelemetryRepository;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::simulation_api::{SimulationApiAppState, simulation_api_routes};
use crate::telematics_api::{TelematicsApiAppState, telematics_api_routes};

pub fn create_api_router(
    orchestrator: JobOrchestrator,
    telemetry: Arc<dyn TelemetryRepository>,
) -> Router {
    info!(runtime = orchestrator.runtime_name(), "Registering API routes");

    Router::new()
        .merge(simulation_api_routes(SimulationApiAppState::new(orchestrator)))
        .merge(telematics_api_routes(TelematicsApiAppState::new(telemetry)))
        .layer(TraceLayer::new_for_http())
}
