//! In-process execution runtime
//!
//! Runs the simulation worker on the caller's task instead of starting a
//! container. Used for local runs and end-to-end tests; unlike the Docker
//! runtime it observes the environment's exit and reports it.

use async_trait::async_trait;
use axle_core::{ExitInfo, JobId};
use axle_ports::{ExecutionRuntime, LaunchResult, LaunchSpec, RuntimeError};
use std::sync::Arc;
use tracing::debug;

use crate::simulation::SimulationWorker;

#[derive(Debug, Clone)]
pub struct InProcessRuntime {
    worker: Arc<SimulationWorker>,
}

impl InProcessRuntime {
    pub fn new(worker: Arc<SimulationWorker>) -> Self {
        Self { worker }
    }

    pub fn environment_id(job_id: &JobId) -> String {
        format!("in-process-{}", job_id)
    }
}

#[async_trait]
impl ExecutionRuntime for InProcessRuntime {
    fn name(&self) -> &str {
        "in-process"
    }

    async fn ping(&self) -> Result<(), RuntimeError> {
        Ok(())
    }

    async fn launch(
        &self,
        job_id: &JobId,
        spec: &LaunchSpec,
    ) -> Result<LaunchResult, RuntimeError> {
        debug!(job_id = %job_id, image = %spec.image, "Running simulation in process");

        let report = self.worker.run(*job_id).await;
        let exit = match &report.outcome {
            Ok(_) => ExitInfo::success(),
            Err(err) => ExitInfo::failure(i64::from(report.exit_code()), err.to_string()),
        };

        Ok(LaunchResult {
            environment_id: Self::environment_id(job_id),
            exit: Some(exit),
        })
    }
}
