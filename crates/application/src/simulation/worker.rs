//! Simulation Worker
//!
//! Runs inside a single-use environment: generate the dataset, upload it as
//! one whole object, then announce it on the queue. The notification is only
//! published after the store acknowledged the upload, so a consumer reacting
//! to it always finds the object.

use axle_core::{
    CompletionNotification, DomainError, JobId, NotificationFormat, SimulationArtifact,
};
use axle_ports::{
    DatasetEncoder, EncodeError, ObjectStore, ObjectStoreError, QueueChannel, QueueConnector,
    QueueError,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, error, info, info_span, warn};

use super::source::TelemetrySource;

/// Stage of one worker run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStage {
    Generating,
    Uploading,
    Notifying,
    Done,
    Failed,
}

impl WorkerStage {
    pub fn can_transition_to(&self, next: &Self) -> bool {
        matches!(
            (self, next),
            (Self::Generating, Self::Uploading)
                | (Self::Uploading, Self::Notifying)
                | (Self::Notifying, Self::Done)
                | (Self::Generating, Self::Failed)
                | (Self::Uploading, Self::Failed)
                | (Self::Notifying, Self::Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generating => "generating",
            Self::Uploading => "uploading",
            Self::Notifying => "notifying",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for WorkerStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("Telemetry generation failed: {0}")]
    Generation(String),

    #[error("Dataset encoding failed: {0}")]
    Encoding(#[from] EncodeError),

    #[error("Upload failed: {0}")]
    Upload(#[from] ObjectStoreError),

    #[error("Notification failed: {0}")]
    Publish(#[from] QueueError),

    #[error("Notification could not be rendered: {0}")]
    Notification(String),

    #[error(transparent)]
    Lifecycle(DomainError),
}

impl From<WorkerError> for DomainError {
    fn from(err: WorkerError) -> Self {
        match err {
            WorkerError::Generation(msg) => DomainError::Upload(msg),
            WorkerError::Encoding(e) => DomainError::Upload(e.to_string()),
            WorkerError::Upload(e) => e.into(),
            WorkerError::Publish(e) => e.into(),
            WorkerError::Notification(msg) => DomainError::Publish(msg),
            WorkerError::Lifecycle(e) => e,
        }
    }
}

/// Where and how the worker hands off its artifact
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub bucket: String,
    pub queue_name: String,
    pub format: NotificationFormat,
    /// Upper bound for each store or queue round trip
    pub operation_timeout: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            bucket: "raw-telemetry".to_string(),
            queue_name: "data_ready".to_string(),
            format: NotificationFormat::default(),
            operation_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of one run, with every stage it passed through
#[derive(Debug, Clone)]
pub struct RunReport {
    pub job_id: JobId,
    pub stages: Vec<WorkerStage>,
    pub outcome: Result<CompletionNotification, WorkerError>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn final_stage(&self) -> WorkerStage {
        self.stages
            .last()
            .copied()
            .unwrap_or(WorkerStage::Generating)
    }

    /// Process exit code for the environment running this worker
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}

struct StageTracker {
    current: WorkerStage,
    history: Vec<WorkerStage>,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            current: WorkerStage::Generating,
            history: vec![WorkerStage::Generating],
        }
    }

    fn advance(&mut self, next: WorkerStage) -> Result<(), WorkerError> {
        if !self.current.can_transition_to(&next) {
            return Err(WorkerError::Lifecycle(DomainError::invalid_state_transition(
                self.current,
                next,
            )));
        }
        self.current = next;
        self.history.push(next);
        Ok(())
    }

    fn fail(&mut self) {
        if !self.current.is_terminal() {
            self.current = WorkerStage::Failed;
            self.history.push(WorkerStage::Failed);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationWorker {
    source: Arc<dyn TelemetrySource>,
    encoder: Arc<dyn DatasetEncoder>,
    store: Arc<dyn ObjectStore>,
    queue: Arc<dyn QueueConnector>,
    settings: WorkerSettings,
}

impl SimulationWorker {
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        encoder: Arc<dyn DatasetEncoder>,
        store: Arc<dyn ObjectStore>,
        queue: Arc<dyn QueueConnector>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            source,
            encoder,
            store,
            queue,
            settings,
        }
    }

    /// Run the pipeline once for `job_id`. Never panics; failures are
    /// reported in the returned `RunReport`.
    pub async fn run(&self, job_id: JobId) -> RunReport {
        let span = info_span!("simulation_run", job_id = %job_id);
        async move {
            let mut tracker = StageTracker::new();
            let outcome = self.execute(&job_id, &mut tracker).await;

            match &outcome {
                Ok(notification) => info!(
                    job_id = %job_id,
                    bucket = %notification.bucket,
                    key = %notification.object_key,
                    "Simulation data published"
                ),
                Err(err) => {
                    let stage = tracker.current;
                    tracker.fail();
                    error!(job_id = %job_id, stage = %stage, error = %err, "Simulation run failed");
                }
            }

            RunReport {
                job_id,
                stages: tracker.history,
                outcome,
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        job_id: &JobId,
        tracker: &mut StageTracker,
    ) -> Result<CompletionNotification, WorkerError> {
        let frame = self
            .source
            .generate(job_id)
            .await
            .map_err(|e| WorkerError::Generation(e.to_string()))?;
        if frame.is_empty() {
            return Err(WorkerError::Generation(
                "source produced no samples".to_string(),
            ));
        }
        info!(job_id = %job_id, rows = frame.len(), "Telemetry generated");

        tracker.advance(WorkerStage::Uploading)?;
        let body = self.encoder.encode(&frame)?;
        let artifact = SimulationArtifact::new(*job_id, &self.settings.bucket, self.encoder.format());
        self.upload(&artifact, body).await?;

        tracker.advance(WorkerStage::Notifying)?;
        let notification = CompletionNotification::for_artifact(&artifact);
        let message = notification
            .to_body(self.settings.format)
            .map_err(|e| WorkerError::Notification(e.to_string()))?;
        self.notify(message).await?;

        tracker.advance(WorkerStage::Done)?;
        Ok(notification)
    }

    async fn upload(&self, artifact: &SimulationArtifact, body: Vec<u8>) -> Result<(), WorkerError> {
        let timeout = self.settings.operation_timeout;
        let size = body.len();

        tokio::time::timeout(
            timeout,
            self.store.put(
                &artifact.bucket,
                &artifact.key,
                body,
                artifact.format.content_type(),
            ),
        )
        .await
        .map_err(|_| ObjectStoreError::Timeout(timeout))??;

        info!(
            job_id = %artifact.job_id,
            bucket = %artifact.bucket,
            key = %artifact.key,
            size = size,
            "Dataset uploaded"
        );
        Ok(())
    }

    /// Open a channel, publish one message, and release the channel whatever
    /// the outcome.
    async fn notify(&self, message: Vec<u8>) -> Result<(), WorkerError> {
        let timeout = self.settings.operation_timeout;

        let channel = tokio::time::timeout(timeout, self.queue.connect())
            .await
            .map_err(|_| QueueError::Timeout(timeout))??;

        let published = self.publish_on(channel.as_ref(), message).await;

        match tokio::time::timeout(timeout, channel.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to close queue channel"),
            Err(_) => warn!(timeout = ?timeout, "Timed out closing queue channel"),
        }

        published
    }

    async fn publish_on(
        &self,
        channel: &dyn QueueChannel,
        message: Vec<u8>,
    ) -> Result<(), WorkerError> {
        let timeout = self.settings.operation_timeout;
        let queue = self.settings.queue_name.as_str();

        tokio::time::timeout(timeout, channel.declare_queue(queue))
            .await
            .map_err(|_| QueueError::Timeout(timeout))??;

        tokio::time::timeout(timeout, channel.publish(queue, message))
            .await
            .map_err(|_| QueueError::Timeout(timeout))??;

        Ok(())
    }
}
