//! Application Layer
//!
//! Job orchestration on the server side and the simulation worker that runs
//! inside each execution environment.

pub mod orchestrator;
pub mod runtime;
pub mod simulation;

pub use orchestrator::{HealthStatus, JobOrchestrator, JobTicket};
pub use runtime::InProcessRuntime;
pub use simulation::{
    RunReport, SampleTelemetrySource, SimulationWorker, TelemetrySource, WorkerError,
    WorkerSettings, WorkerStage,
};
