//! Consumer-group subscription used by the worker.
//!
//! Uses rdkafka so that partitions are shared across every worker in the
//! group and positions survive restarts:
//! - auto commit is off; positions are committed explicitly per message
//! - a failed write rewinds the partition so the message is redelivered
//!
//! Commits are synchronous so a returned `Ok` means the broker has the
//! position. Those calls and seeks block on a broker round-trip and run on
//! the blocking pool.

use crate::config::RedpandaConfig;
use crate::message::{MessageSource, QueueMessage};
use activity_core::{Error, Result};
use async_trait::async_trait;
use rdkafka::consumer::{CommitMode, Consumer as _, StreamConsumer};
use rdkafka::error::KafkaResult;
use rdkafka::message::Message;
use rdkafka::{ClientConfig, Offset, TopicPartitionList};
use std::sync::Arc;
use std::time::Duration;
use telemetry::metrics;
use tracing::{debug, info};

/// Redpanda consumer joined to the activity workers group.
pub struct Consumer {
    inner: Arc<StreamConsumer>,
    config: RedpandaConfig,
}

impl Consumer {
    /// Creates the consumer and subscribes to the configured topic.
    pub fn new(config: &RedpandaConfig) -> Result<Self> {
        config.validate()?;

        let inner: StreamConsumer = client_config(config)
            .create()
            .map_err(|e| Error::startup(format!("Failed to create Redpanda consumer: {}", e)))?;

        inner
            .subscribe(&[config.topic.as_str()])
            .map_err(|e| Error::startup(format!("Failed to subscribe to topic: {}", e)))?;

        info!(
            brokers = %config.broker_string(),
            topic = %config.topic,
            group_id = %config.consumer.group_id,
            "Redpanda consumer initialized"
        );

        Ok(Self {
            inner: Arc::new(inner),
            config: config.clone(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RedpandaConfig {
        &self.config
    }

    async fn blocking<T, F>(&self, op: F) -> Result<KafkaResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&StreamConsumer) -> KafkaResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&inner))
            .await
            .map_err(|e| Error::read(format!("Consumer task failed: {}", e)))
    }
}

fn client_config(config: &RedpandaConfig) -> ClientConfig {
    let mut client = ClientConfig::new();
    client
        .set("bootstrap.servers", config.broker_string())
        .set("group.id", &config.consumer.group_id)
        .set("enable.auto.commit", "false")
        .set("enable.auto.offset.store", "false")
        .set("enable.partition.eof", "false")
        .set("auto.offset.reset", &config.consumer.auto_offset_reset)
        .set(
            "session.timeout.ms",
            config.consumer.session_timeout_ms.to_string(),
        );
    client
}

#[async_trait]
impl MessageSource for Consumer {
    async fn next_message(&self) -> Result<QueueMessage> {
        let msg = self.inner.recv().await.map_err(|e| {
            metrics().read_errors.inc();
            Error::read(format!("Failed to read from Redpanda: {}", e))
        })?;

        metrics().events_consumed.inc();

        Ok(QueueMessage {
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
            payload: msg.payload().map(<[u8]>::to_vec),
            timestamp_ms: msg.timestamp().to_millis(),
        })
    }

    async fn commit(&self, message: &QueueMessage) -> Result<()> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(
            &message.topic,
            message.partition,
            Offset::Offset(message.next_offset()),
        )
        .map_err(|e| Error::read(format!("Invalid commit position: {}", e)))?;

        self.blocking(move |consumer| consumer.commit(&tpl, CommitMode::Sync))
            .await?
            .map_err(|e| Error::read(format!("Failed to commit offset: {}", e)))?;

        debug!(
            partition = message.partition,
            offset = message.offset,
            "Committed offset"
        );
        Ok(())
    }

    async fn rewind(&self, message: &QueueMessage) -> Result<()> {
        let topic = message.topic.clone();
        let (partition, offset) = (message.partition, message.offset);
        let timeout = Duration::from_millis(self.config.consumer.seek_timeout_ms);

        self.blocking(move |consumer| {
            consumer.seek(&topic, partition, Offset::Offset(offset), timeout)
        })
        .await?
        .map_err(|e| Error::read(format!("Failed to rewind partition: {}", e)))?;

        metrics().events_rewound.inc();
        debug!(
            partition = message.partition,
            offset = message.offset,
            "Rewound partition"
        );
        Ok(())
    }

    async fn close(&self) {
        self.inner.unsubscribe();
        info!(group_id = %self.config.consumer.group_id, "Left consumer group");
    }
}
