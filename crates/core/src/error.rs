//! Error types shared across the system

use thiserror::Error;

/// Base error taxonomy for the simulation pipeline.
///
/// Port-level errors (object store, queue, runtime, repository) map into this
/// enum when they cross into synchronous request paths.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("timeout: {0}")]
    Timeout(String),
}

impl DomainError {
    pub fn invalid_state_transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Whether a caller may reasonably retry the failed operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_transition_message() {
        let err = DomainError::invalid_state_transition("Done", "Uploading");
        assert_eq!(
            err.to_string(),
            "invalid state transition from Done to Uploading"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(DomainError::BackendUnavailable("minio".to_string()).is_transient());
        assert!(DomainError::Timeout("put".to_string()).is_transient());
        assert!(!DomainError::Configuration("host path".to_string()).is_transient());
        assert!(!DomainError::NotFound("VIN001".to_string()).is_transient());
    }
}
