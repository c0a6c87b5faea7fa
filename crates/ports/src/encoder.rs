//! Dataset Encoder Port

use axle_core::{ArtifactFormat, TelemetryFrame};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Cannot encode an empty dataset")]
    Empty,

    #[error("Encoding failed: {0}")]
    Encoding(String),
}

/// Serializes an in-memory dataset into a single buffer
pub trait DatasetEncoder: Send + Sync + std::fmt::Debug {
    fn format(&self) -> ArtifactFormat;

    fn encode(&self, frame: &TelemetryFrame) -> Result<Vec<u8>, EncodeError>;
}
