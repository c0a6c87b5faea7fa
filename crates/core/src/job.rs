//! Simulation job identity and lifecycle bookkeeping
//!
//! A `JobRecord` lives only in memory for the duration of a launch. Durability
//! of a job's output is carried by the object store and the queue, never by
//! this record.

use crate::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|e| DomainError::Configuration(format!("invalid job id '{}': {}", value, e)))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for JobId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-supplied job parameters.
///
/// The current contract requires no fields; anything sent is carried along
/// but not interpreted by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
}

impl JobRequest {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Orchestrator-side view of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted for execution; launch not attempted yet
    Accepted,
    /// The runtime reported the environment as started
    Launched,
    /// The runtime reported the environment's exit
    Exited,
    /// The environment never started
    FailedToStart,
}

impl JobState {
    pub fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (Self::Accepted, Self::Launched)
                | (Self::Accepted, Self::FailedToStart)
                | (Self::Launched, Self::Exited)
        )
    }

    /// Launch is out of the orchestrator's hands once the job reaches one of
    /// these states; exit supervision is not part of the orchestrator.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Accepted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Launched => "launched",
            Self::Exited => "exited",
            Self::FailedToStart => "failed_to_start",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exit information reported for a job's execution environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitInfo {
    pub exit_code: Option<i64>,
    pub message: Option<String>,
}

impl ExitInfo {
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            message: None,
        }
    }

    pub fn failure(exit_code: i64, message: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            message: Some(message.into()),
        }
    }

    pub fn failed_to_start(reason: impl Into<String>) -> Self {
        Self {
            exit_code: None,
            message: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Lifecycle events reported by an execution runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Started {
        environment_id: String,
        at: DateTime<Utc>,
    },
    Exited(ExitInfo),
    FailedToStart {
        reason: String,
    },
}

impl LifecycleEvent {
    fn target_state(&self) -> JobState {
        match self {
            Self::Started { .. } => JobState::Launched,
            Self::Exited(_) => JobState::Exited,
            Self::FailedToStart { .. } => JobState::FailedToStart,
        }
    }
}

/// In-memory record of one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub state: JobState,
    pub accepted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub environment_id: Option<String>,
    pub exit_info: Option<ExitInfo>,
}

impl JobRecord {
    pub fn accepted(job_id: JobId) -> Self {
        Self {
            job_id,
            state: JobState::Accepted,
            accepted_at: Utc::now(),
            started_at: None,
            environment_id: None,
            exit_info: None,
        }
    }

    /// Apply a runtime lifecycle event, rejecting events the current state
    /// does not admit.
    pub fn apply(&mut self, event: LifecycleEvent) -> Result<(), DomainError> {
        let target = event.target_state();
        if !self.state.can_transition_to(&target) {
            return Err(DomainError::invalid_state_transition(self.state, target));
        }

        match event {
            LifecycleEvent::Started { environment_id, at } => {
                self.started_at = Some(at);
                self.environment_id = Some(environment_id);
            }
            LifecycleEvent::Exited(info) => {
                self.exit_info = Some(info);
            }
            LifecycleEvent::FailedToStart { reason } => {
                self.exit_info = Some(ExitInfo::failed_to_start(reason));
            }
        }
        self.state = target;
        Ok(())
    }
}
