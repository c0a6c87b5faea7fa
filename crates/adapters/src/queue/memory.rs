//! In-memory queue
//!
//! Broadcast-backed broker used by tests and the in-process runtime. Keeps a
//! durable log per declared queue and counts connections so callers can
//! assert that every channel was released.

use async_trait::async_trait;
use axle_ports::{QueueChannel, QueueConnector, QueueError};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::broadcast;

/// Message delivered to in-memory subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub queue: String,
    pub body: Vec<u8>,
}

#[derive(Debug)]
struct Broker {
    sender: broadcast::Sender<QueuedMessage>,
    queues: DashMap<String, Vec<Vec<u8>>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    fail_connect: AtomicBool,
    fail_publish: AtomicBool,
}

#[derive(Debug, Clone)]
pub struct InMemoryQueue {
    broker: Arc<Broker>,
    capacity: usize,
}

impl InMemoryQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            broker: Arc::new(Broker {
                sender,
                queues: DashMap::new(),
                opened: AtomicUsize::new(0),
                closed: AtomicUsize::new(0),
                fail_connect: AtomicBool::new(false),
                fail_publish: AtomicBool::new(false),
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Live feed of every message published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<QueuedMessage> {
        self.broker.sender.subscribe()
    }

    /// Messages retained for `queue`, oldest first
    pub fn messages(&self, queue: &str) -> Vec<Vec<u8>> {
        self.broker
            .queues
            .get(queue)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn is_declared(&self, queue: &str) -> bool {
        self.broker.queues.contains_key(queue)
    }

    pub fn opened_connections(&self) -> usize {
        self.broker.opened.load(Ordering::SeqCst)
    }

    pub fn closed_connections(&self) -> usize {
        self.broker.closed.load(Ordering::SeqCst)
    }

    /// Connections handed out and not yet closed
    pub fn open_connections(&self) -> usize {
        self.opened_connections()
            .saturating_sub(self.closed_connections())
    }

    pub fn fail_connect(&self, fail: bool) {
        self.broker.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn fail_publish(&self, fail: bool) {
        self.broker.fail_publish.store(fail, Ordering::SeqCst);
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new(1_000)
    }
}

#[async_trait]
impl QueueConnector for InMemoryQueue {
    async fn connect(&self) -> Result<Box<dyn QueueChannel>, QueueError> {
        if self.broker.fail_connect.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable(
                "in-memory broker refused connection".to_string(),
            ));
        }
        self.broker.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryChannel {
            broker: self.broker.clone(),
        }))
    }
}

struct InMemoryChannel {
    broker: Arc<Broker>,
}

#[async_trait]
impl QueueChannel for InMemoryChannel {
    async fn declare_queue(&self, queue: &str) -> Result<(), QueueError> {
        self.broker.queues.entry(queue.to_string()).or_default();
        Ok(())
    }

    async fn publish(&self, queue: &str, body: Vec<u8>) -> Result<(), QueueError> {
        if self.broker.fail_publish.load(Ordering::SeqCst) {
            return Err(QueueError::NotAcknowledged {
                queue: queue.to_string(),
                reason: "in-memory broker rejected publish".to_string(),
            });
        }

        match self.broker.queues.get_mut(queue) {
            Some(mut messages) => messages.push(body.clone()),
            None => {
                return Err(QueueError::NotAcknowledged {
                    queue: queue.to_string(),
                    reason: "queue not declared".to_string(),
                });
            }
        }

        // No subscribers is fine; the message is retained above.
        let _ = self.broker.sender.send(QueuedMessage {
            queue: queue.to_string(),
            body,
        });
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), QueueError> {
        self.broker.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
