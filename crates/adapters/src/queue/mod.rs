//! Queue adapters

pub mod memory;
pub mod nats;

pub use memory::{InMemoryQueue, QueuedMessage};
pub use nats::{NatsQueueChannel, NatsQueueConfig, NatsQueueConnector};
