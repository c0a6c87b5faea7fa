//! Simulation artifacts and completion notifications
//!
//! The object key of an artifact is a pure function of its `JobId`; consumers
//! rely on the `simulations/{job_id}/data.{ext}` layout.

use crate::error::DomainError;
use crate::job::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix under which every simulation artifact is stored
pub const ARTIFACT_PREFIX: &str = "simulations";

/// Current version of the structured notification schema
pub const NOTIFICATION_SCHEMA_VERSION: u32 = 1;

/// Serialization format of a stored dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    Parquet,
}

impl ArtifactFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Parquet => "parquet",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Parquet => "application/vnd.apache.parquet",
        }
    }
}

/// Deterministic object key for a job's dataset
pub fn artifact_key(job_id: &JobId, format: ArtifactFormat) -> String {
    format!("{}/{}/data.{}", ARTIFACT_PREFIX, job_id, format.extension())
}

/// Location of a job's dataset in the object store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationArtifact {
    pub job_id: JobId,
    pub bucket: String,
    pub key: String,
    pub format: ArtifactFormat,
}

impl SimulationArtifact {
    pub fn new(job_id: JobId, bucket: impl Into<String>, format: ArtifactFormat) -> Self {
        Self {
            job_id,
            bucket: bucket.into(),
            key: artifact_key(&job_id, format),
            format,
        }
    }
}

/// Body layout used when publishing a notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationFormat {
    /// Versioned JSON document
    #[default]
    Structured,
    /// `New data available: bucket=..., path=...` plain text
    Legacy,
}

impl std::str::FromStr for NotificationFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "structured" | "json" => Ok(Self::Structured),
            "legacy" | "text" | "plain" => Ok(Self::Legacy),
            _ => Err(format!(
                "Invalid message format: {}. Valid values are: structured, legacy",
                s
            )),
        }
    }
}

impl std::fmt::Display for NotificationFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

/// Message announcing that an artifact is ready to be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionNotification {
    pub schema_version: u32,
    pub job_id: JobId,
    pub bucket: String,
    pub object_key: String,
    pub produced_at: DateTime<Utc>,
    /// Human readable line, identical to the legacy plain-text body
    pub summary: String,
}

impl CompletionNotification {
    pub fn for_artifact(artifact: &SimulationArtifact) -> Self {
        Self {
            schema_version: NOTIFICATION_SCHEMA_VERSION,
            job_id: artifact.job_id,
            bucket: artifact.bucket.clone(),
            object_key: artifact.key.clone(),
            produced_at: Utc::now(),
            summary: legacy_line(&artifact.bucket, &artifact.key),
        }
    }

    /// Render the message body in the requested layout
    pub fn to_body(&self, format: NotificationFormat) -> Result<Vec<u8>, DomainError> {
        match format {
            NotificationFormat::Structured => serde_json::to_vec(self).map_err(|e| {
                DomainError::Publish(format!("failed to serialize notification: {}", e))
            }),
            NotificationFormat::Legacy => Ok(self.summary.clone().into_bytes()),
        }
    }

    /// Parse a structured body, falling back to the legacy line.
    ///
    /// The legacy layout carries no job id or timestamp; the job id is
    /// recovered from the object key and `produced_at` is set to now.
    pub fn from_body(body: &[u8]) -> Result<Self, DomainError> {
        if let Ok(notification) = serde_json::from_slice::<Self>(body) {
            if notification.schema_version > NOTIFICATION_SCHEMA_VERSION {
                return Err(DomainError::Publish(format!(
                    "unsupported notification schema version {}",
                    notification.schema_version
                )));
            }
            return Ok(notification);
        }

        let text = std::str::from_utf8(body)
            .map_err(|e| DomainError::Publish(format!("notification is not UTF-8: {}", e)))?;
        let (bucket, key) = parse_legacy_line(text)?;
        let job_id = job_id_from_key(&key)?;
        Ok(Self {
            schema_version: 0,
            job_id,
            summary: legacy_line(&bucket, &key),
            bucket,
            object_key: key,
            produced_at: Utc::now(),
        })
    }
}

fn legacy_line(bucket: &str, key: &str) -> String {
    format!("New data available: bucket={}, path={}", bucket, key)
}

fn parse_legacy_line(text: &str) -> Result<(String, String), DomainError> {
    let rest = text
        .trim()
        .strip_prefix("New data available:")
        .ok_or_else(|| DomainError::Publish(format!("unrecognized notification: {}", text)))?;

    let mut bucket = None;
    let mut path = None;
    for part in rest.split(',') {
        match part.trim().split_once('=') {
            Some(("bucket", value)) => bucket = Some(value.trim().to_string()),
            Some(("path", value)) => path = Some(value.trim().to_string()),
            _ => {}
        }
    }

    match (bucket, path) {
        (Some(bucket), Some(path)) => Ok((bucket, path)),
        _ => Err(DomainError::Publish(format!(
            "notification missing bucket or path: {}",
            text
        ))),
    }
}

fn job_id_from_key(key: &str) -> Result<JobId, DomainError> {
    let mut segments = key.split('/');
    match (segments.next(), segments.next()) {
        (Some(ARTIFACT_PREFIX), Some(id)) => JobId::parse(id),
        _ => Err(DomainError::Publish(format!(
            "object key does not follow the artifact layout: {}",
            key
        ))),
    }
}
