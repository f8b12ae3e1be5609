//! Queue messages and the subscription seam used by the worker.

use activity_core::Result;
use async_trait::async_trait;

/// A message read from the activity topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    /// Record value; `None` for tombstones
    pub payload: Option<Vec<u8>>,
    /// Broker timestamp in milliseconds, when present
    pub timestamp_ms: Option<i64>,
}

impl QueueMessage {
    /// Payload bytes, empty for tombstones.
    pub fn payload(&self) -> &[u8] {
        self.payload.as_deref().unwrap_or_default()
    }

    /// Offset to record once this message is fully handled.
    pub fn next_offset(&self) -> i64 {
        self.offset + 1
    }
}

/// A consumer-group subscription delivering messages one at a time.
///
/// Delivery is at-least-once: a message whose position was never committed
/// is delivered again after a restart or rebalance.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Waits for the next message.
    async fn next_message(&self) -> Result<QueueMessage>;

    /// Records that everything up to and including `message` is handled.
    async fn commit(&self, message: &QueueMessage) -> Result<()>;

    /// Repositions the subscription so `message` is delivered again.
    async fn rewind(&self, message: &QueueMessage) -> Result<()>;

    /// Leaves the consumer group.
    async fn close(&self);
}
