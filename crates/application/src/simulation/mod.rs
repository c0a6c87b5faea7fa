//! Simulation worker and its telemetry sources

pub mod source;
pub mod worker;

pub use source::{SampleTelemetrySource, TelemetrySource};
pub use worker::{RunReport, SimulationWorker, WorkerError, WorkerSettings, WorkerStage};
