//! AxleOS Server Library
//!
//! HTTP surface of the simulation pipeline: job submission, job status,
//! health, and the read-only telematics queries.

pub mod api_router;
pub mod bootstrap;
pub mod error;
pub mod simulation_api;
pub mod telematics_api;

pub use api_router::create_api_router;
pub use bootstrap::{BootstrapError, ServerComponents, initialize_server, log_config_summary};
pub use error::{ApiError, ApiResult};
