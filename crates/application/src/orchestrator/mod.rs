//! Job Orchestrator
//!
//! Accepts simulation requests, assigns each a fresh `JobId` and hands the
//! launch to a background task. The caller never waits for the runtime and
//! never sees a launch failure; those are logged and reported on the job's
//! ticket. Only jobs still being launched stay in the registry.

use axle_core::{JobId, JobRecord, JobRequest, LifecycleEvent, Utc};
use axle_ports::{ExecutionRuntime, LaunchResult, LaunchSpec, RuntimeError};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{Instrument, error, info, info_span, warn};

/// Liveness probe payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Handle on a submitted job
#[derive(Debug)]
pub struct JobTicket {
    pub job_id: JobId,
    receiver: watch::Receiver<JobRecord>,
}

impl JobTicket {
    /// Wait until the job reaches a terminal state and return its record
    pub async fn outcome(mut self) -> JobRecord {
        let terminal = self
            .receiver
            .wait_for(|record| record.state.is_terminal())
            .await
            .map(|record| record.clone());

        match terminal {
            Ok(record) => record,
            // Sender gone: the latest value is as final as it gets.
            Err(_) => self.receiver.borrow().clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobOrchestrator {
    runtime: Arc<dyn ExecutionRuntime>,
    spec: Arc<LaunchSpec>,
    jobs: Arc<DashMap<JobId, watch::Receiver<JobRecord>>>,
}

impl JobOrchestrator {
    pub fn new(runtime: Arc<dyn ExecutionRuntime>, spec: LaunchSpec) -> Self {
        Self {
            runtime,
            spec: Arc::new(spec),
            jobs: Arc::new(DashMap::new()),
        }
    }

    pub fn runtime_name(&self) -> &str {
        self.runtime.name()
    }

    /// Accept a request and launch it in the background
    pub fn submit(&self, request: JobRequest) -> JobId {
        self.submit_tracked(request).job_id
    }

    /// Same as `submit`, returning a ticket that resolves once the launch
    /// attempt has finished
    pub fn submit_tracked(&self, request: JobRequest) -> JobTicket {
        let job_id = JobId::new();
        let (sender, receiver) = watch::channel(JobRecord::accepted(job_id));
        self.jobs.insert(job_id, receiver.clone());

        info!(
            job_id = %job_id,
            parameters = request.parameters.len(),
            runtime = self.runtime.name(),
            "Simulation job accepted"
        );

        let runtime = self.runtime.clone();
        let spec = self.spec.clone();
        let jobs = self.jobs.clone();
        let span = info_span!("simulation_job", job_id = %job_id);

        tokio::spawn(
            async move {
                let outcome = runtime.launch(&job_id, &spec).await;
                // Leave the registry before the ticket can observe the
                // terminal state.
                jobs.remove(&job_id);
                sender.send_modify(|record| record_launch(record, outcome));
            }
            .instrument(span),
        );

        JobTicket { job_id, receiver }
    }

    /// Latest record of a job still being launched; `None` once the job is
    /// terminal or was never submitted
    pub fn status(&self, job_id: &JobId) -> Option<JobRecord> {
        self.jobs.get(job_id).map(|entry| entry.value().borrow().clone())
    }

    /// Jobs whose launch has not finished yet
    pub fn in_flight(&self) -> usize {
        self.jobs.len()
    }

    /// Independent of job state and runtime reachability
    pub fn health(&self) -> HealthStatus {
        HealthStatus::ok()
    }
}

fn record_launch(record: &mut JobRecord, outcome: Result<LaunchResult, RuntimeError>) {
    let job_id = record.job_id;
    match outcome {
        Ok(LaunchResult {
            environment_id,
            exit,
        }) => {
            info!(job_id = %job_id, environment_id = %environment_id, "Simulation environment launched");
            let started = LifecycleEvent::Started {
                environment_id,
                at: Utc::now(),
            };
            if let Err(e) = record.apply(started) {
                warn!(job_id = %job_id, error = %e, "Ignoring lifecycle event");
                return;
            }
            if let Some(exit) = exit {
                if exit.is_success() {
                    info!(job_id = %job_id, "Simulation environment exited cleanly");
                } else {
                    warn!(
                        job_id = %job_id,
                        exit_code = ?exit.exit_code,
                        message = ?exit.message,
                        "Simulation environment exited with failure"
                    );
                }
                if let Err(e) = record.apply(LifecycleEvent::Exited(exit)) {
                    warn!(job_id = %job_id, error = %e, "Ignoring lifecycle event");
                }
            }
        }
        Err(err) => {
            error!(job_id = %job_id, error = %err, "Failed to launch simulation");
            if let Err(e) = record.apply(LifecycleEvent::FailedToStart {
                reason: err.to_string(),
            }) {
                warn!(job_id = %job_id, error = %e, "Ignoring lifecycle event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axle_core::{ExitInfo, JobState};
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Debug, Default)]
    struct RecordingRuntime {
        launches: AtomicUsize,
        fail_with: Option<RuntimeError>,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl ExecutionRuntime for RecordingRuntime {
        fn name(&self) -> &str {
            "recording"
        }

        async fn ping(&self) -> Result<(), RuntimeError> {
            Ok(())
        }

        async fn launch(
            &self,
            job_id: &JobId,
            _spec: &LaunchSpec,
        ) -> Result<LaunchResult, RuntimeError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.launches.fetch_add(1, Ordering::SeqCst);
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(LaunchResult {
                    environment_id: format!("env-{}", job_id),
                    exit: None,
                }),
            }
        }
    }

    fn spec() -> LaunchSpec {
        LaunchSpec {
            image: "simulator:latest".to_string(),
            host_path: Some(PathBuf::from("/opt/BeamNG.tech")),
            mount_target: "/app/BeamNG.tech".to_string(),
            network: "infrastructure_default".to_string(),
            environment: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_submit_returns_before_launch_completes() {
        let gate = Arc::new(Notify::new());
        let runtime = Arc::new(RecordingRuntime {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let orchestrator = JobOrchestrator::new(runtime.clone(), spec());

        let ticket = orchestrator.submit_tracked(JobRequest::empty());

        let record = orchestrator.status(&ticket.job_id).unwrap();
        assert_eq!(record.state, JobState::Accepted);
        assert_eq!(orchestrator.in_flight(), 1);

        gate.notify_one();
        let record = ticket.outcome().await;
        assert_eq!(record.state, JobState::Launched);
        assert_eq!(record.environment_id, Some(format!("env-{}", record.job_id)));
        assert_eq!(runtime.launches.load(Ordering::SeqCst), 1);
        assert_eq!(orchestrator.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_launch_failure_is_recorded_not_raised() {
        let runtime = Arc::new(RecordingRuntime {
            fail_with: Some(RuntimeError::Unavailable("daemon down".to_string())),
            ..Default::default()
        });
        let orchestrator = JobOrchestrator::new(runtime, spec());

        let ticket = orchestrator.submit_tracked(JobRequest::empty());
        let job_id = ticket.job_id;
        let record = ticket.outcome().await;

        assert_eq!(record.state, JobState::FailedToStart);
        let exit = record.exit_info.unwrap();
        assert_eq!(exit.exit_code, None);
        assert!(exit.message.unwrap().contains("daemon down"));
        assert!(orchestrator.status(&job_id).is_none());
    }

    #[tokio::test]
    async fn test_observed_exit_is_applied() {
        let mut record = JobRecord::accepted(JobId::new());
        record_launch(
            &mut record,
            Ok(LaunchResult {
                environment_id: "in-process".to_string(),
                exit: Some(ExitInfo::failure(1, "upload failed")),
            }),
        );

        assert_eq!(record.state, JobState::Exited);
        assert_eq!(record.exit_info.unwrap().exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_terminal_records_leave_the_registry() {
        let runtime = Arc::new(RecordingRuntime::default());
        let orchestrator = JobOrchestrator::new(runtime, spec());

        for _ in 0..5 {
            let ticket = orchestrator.submit_tracked(JobRequest::empty());
            let job_id = ticket.job_id;
            let record = ticket.outcome().await;
            assert_eq!(record.state, JobState::Launched);
            assert!(orchestrator.status(&job_id).is_none());
        }

        assert!(orchestrator.jobs.is_empty());
        assert_eq!(orchestrator.in_flight(), 0);
    }

    #[test]
    fn test_health_is_static() {
        let orchestrator = JobOrchestrator::new(Arc::new(RecordingRuntime::default()), spec());
        assert_eq!(orchestrator.health(), HealthStatus::ok());
        assert_eq!(orchestrator.runtime_name(), "recording");
    }
}
