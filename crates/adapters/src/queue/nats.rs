//! NATS JetStream Queue Adapter
//!
//! Each named queue is backed by a file-stored JetStream stream bound to a
//! subject of the same name. Publishing waits for the stream's ack, so a
//! message is durable by the time `publish` returns.

use async_nats::jetstream::stream::{Config, DiscardPolicy, StorageType};
use async_trait::async_trait;
use axle_ports::{QueueChannel, QueueConnector, QueueError};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::QueueConfig;

/// Settings for opening JetStream connections
#[derive(Debug, Clone)]
pub struct NatsQueueConfig {
    pub url: String,
    pub connection_timeout: Duration,
    /// Bound for a single declare or publish round trip
    pub request_timeout: Duration,
    pub max_messages: i64,
}

impl Default for NatsQueueConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            connection_timeout: Duration::from_millis(5000),
            request_timeout: Duration::from_secs(30),
            max_messages: 100_000,
        }
    }
}

impl From<&QueueConfig> for NatsQueueConfig {
    fn from(config: &QueueConfig) -> Self {
        Self {
            url: config.url.clone(),
            connection_timeout: Duration::from_millis(config.connection_timeout_ms),
            ..Default::default()
        }
    }
}

/// Opens a fresh JetStream connection per unit of work
#[derive(Debug, Clone)]
pub struct NatsQueueConnector {
    config: NatsQueueConfig,
}

impl NatsQueueConnector {
    pub fn new(config: NatsQueueConfig) -> Self {
        Self { config }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Stream names may not contain the subject separators NATS reserves
    pub fn stream_name(queue: &str) -> String {
        queue
            .chars()
            .map(|c| match c {
                '.' | '*' | '>' | ' ' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect()
    }
}

#[async_trait]
impl QueueConnector for NatsQueueConnector {
    async fn connect(&self) -> Result<Box<dyn QueueChannel>, QueueError> {
        let client = async_nats::ConnectOptions::new()
            .connection_timeout(self.config.connection_timeout)
            .connect(self.config.url.as_str())
            .await
            .map_err(|e| {
                QueueError::Unavailable(format!(
                    "Failed to connect to NATS at '{}': {}",
                    self.config.url, e
                ))
            })?;

        debug!(url = %self.config.url, "Connected to NATS");

        let jetstream = async_nats::jetstream::new(client.clone());
        Ok(Box::new(NatsQueueChannel {
            client,
            jetstream,
            request_timeout: self.config.request_timeout,
            max_messages: self.config.max_messages,
        }))
    }
}

/// A full stream rejects new publishes instead of dropping acknowledged
/// messages, so overflow surfaces as a publish failure.
fn stream_config(queue: &str, max_messages: i64) -> Config {
    Config {
        name: NatsQueueConnector::stream_name(queue),
        subjects: vec![queue.to_string()],
        max_messages,
        discard: DiscardPolicy::New,
        storage: StorageType::File,
        ..Default::default()
    }
}

/// One open JetStream connection
pub struct NatsQueueChannel {
    client: async_nats::Client,
    jetstream: async_nats::jetstream::Context,
    request_timeout: Duration,
    max_messages: i64,
}

#[async_trait]
impl QueueChannel for NatsQueueChannel {
    async fn declare_queue(&self, queue: &str) -> Result<(), QueueError> {
        let declare = self
            .jetstream
            .get_or_create_stream(stream_config(queue, self.max_messages));

        tokio::time::timeout(self.request_timeout, declare)
            .await
            .map_err(|_| QueueError::Timeout(self.request_timeout))?
            .map_err(|e| QueueError::Declare {
                queue: queue.to_string(),
                reason: e.to_string(),
            })?;

        debug!(queue = queue, "Queue declared");
        Ok(())
    }

    async fn publish(&self, queue: &str, body: Vec<u8>) -> Result<(), QueueError> {
        let not_acknowledged = |reason: String| QueueError::NotAcknowledged {
            queue: queue.to_string(),
            reason,
        };

        let publish = async {
            let ack = self
                .jetstream
                .publish(queue.to_string(), body.into())
                .await
                .map_err(|e| not_acknowledged(e.to_string()))?;
            ack.await.map_err(|e| not_acknowledged(e.to_string()))
        };

        let ack = tokio::time::timeout(self.request_timeout, publish)
            .await
            .map_err(|_| QueueError::Timeout(self.request_timeout))??;

        info!(
            queue = queue,
            stream = %ack.stream,
            sequence = ack.sequence,
            "Message acknowledged"
        );
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), QueueError> {
        tokio::time::timeout(self.request_timeout, self.client.flush())
            .await
            .map_err(|_| QueueError::Timeout(self.request_timeout))?
            .map_err(|e| QueueError::Unavailable(format!("Failed to flush connection: {}", e)))?;
        debug!("NATS connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_name_is_sanitized() {
        assert_eq!(NatsQueueConnector::stream_name("data_ready"), "DATA_READY");
        assert_eq!(NatsQueueConnector::stream_name("raw.data>"), "RAW_DATA_");
    }

    #[test]
    fn test_full_stream_rejects_instead_of_dropping() {
        let config = stream_config("data_ready", 10);
        assert_eq!(config.name, "DATA_READY");
        assert_eq!(config.subjects, vec!["data_ready".to_string()]);
        assert_eq!(config.max_messages, 10);
        assert!(matches!(config.discard, DiscardPolicy::New));
        assert!(matches!(config.storage, StorageType::File));
    }

    #[tokio::test]
    async fn test_unreachable_broker_is_unavailable() {
        let connector = NatsQueueConnector::new(NatsQueueConfig {
            url: "nats://127.0.0.1:1".to_string(),
            connection_timeout: Duration::from_millis(200),
            ..Default::default()
        });

        match connector.connect().await {
            Ok(_) => panic!("Should fail to connect to a closed port"),
            Err(e) => assert!(matches!(e, QueueError::Unavailable(_))),
        }
    }

    #[tokio::test]
    async fn test_publish_and_declare_against_local_nats() {
        let connector = NatsQueueConnector::new(NatsQueueConfig::default());
        let channel = match connector.connect().await {
            Ok(channel) => channel,
            Err(e) => {
                println!("⚠️  Cannot connect to NATS in test environment: {:?}", e);
                return;
            }
        };

        channel.declare_queue("axle_test_ready").await.unwrap();
        channel.declare_queue("axle_test_ready").await.unwrap();
        channel
            .publish("axle_test_ready", b"hello".to_vec())
            .await
            .unwrap();
        channel.close().await.unwrap();
    }
}
