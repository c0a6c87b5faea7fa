//! Queue Publisher Port
//!
//! A `QueueConnector` hands out one `QueueChannel` per unit of work. The
//! caller owns the channel and must `close` it on every exit path.

use async_trait::async_trait;
use axle_core::DomainError;
use std::time::Duration;

/// Queue error types
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue broker unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to declare queue '{queue}': {reason}")]
    Declare { queue: String, reason: String },

    #[error("Publish to '{queue}' was not acknowledged: {reason}")]
    NotAcknowledged { queue: String, reason: String },

    #[error("Queue operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Channel closed")]
    Closed,
}

impl From<QueueError> for DomainError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Unavailable(msg) => DomainError::BackendUnavailable(msg),
            QueueError::Timeout(after) => DomainError::Timeout(format!("queue after {:?}", after)),
            other => DomainError::Publish(other.to_string()),
        }
    }
}

/// An open connection to the broker
#[async_trait]
pub trait QueueChannel: Send + Sync {
    /// Declare `queue`; declaring an existing queue is a no-op.
    async fn declare_queue(&self, queue: &str) -> Result<(), QueueError>;

    /// Publish one message and wait until the broker has durably accepted it.
    async fn publish(&self, queue: &str, body: Vec<u8>) -> Result<(), QueueError>;

    /// Flush and release the connection.
    async fn close(self: Box<Self>) -> Result<(), QueueError>;
}

/// Opens broker connections
#[async_trait]
pub trait QueueConnector: Send + Sync + std::fmt::Debug {
    async fn connect(&self) -> Result<Box<dyn QueueChannel>, QueueError>;
}
