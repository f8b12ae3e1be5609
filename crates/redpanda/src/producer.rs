//! Shared Redpanda publisher using rskafka.

use crate::config::RedpandaConfig;
use crate::health::topic_partitions;
use crate::partitioner::LeastBytes;
use activity_core::{Activity, Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use rskafka::client::{
    partition::{PartitionClient, UnknownTopicHandling},
    ClientBuilder,
};
use rskafka::record::Record;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::{health, metrics};
use tracing::{debug, error, info};

/// Where a published event landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReceipt {
    pub partition: i32,
    pub offset: i64,
}

/// Publishes activity events to the queue.
///
/// Implementations are shared by every in-flight request and must be safe
/// for concurrent use.
#[async_trait]
pub trait EventProducer: Send + Sync {
    /// Publishes one event, returning once the broker acknowledged it.
    async fn publish(&self, activity: &Activity) -> Result<PublishReceipt>;

    /// Whether the most recent publish succeeded.
    fn is_healthy(&self) -> bool;
}

struct PartitionSlot {
    id: i32,
    client: Arc<PartitionClient>,
}

/// Redpanda publisher holding one partition client per topic partition.
///
/// rskafka always produces with `acks = -1`, so a successful publish means
/// every in-sync replica has the record.
pub struct Producer {
    config: RedpandaConfig,
    partitions: Vec<PartitionSlot>,
    balancer: LeastBytes,
    healthy: AtomicBool,
}

impl Producer {
    /// Connects to the brokers and opens a client for every partition of
    /// the configured topic.
    pub async fn new(config: RedpandaConfig) -> Result<Self> {
        config.validate()?;

        let client = ClientBuilder::new(config.brokers.clone())
            .build()
            .await
            .map_err(|e| Error::startup(format!("Failed to connect to Redpanda: {}", e)))?;

        let ids = topic_partitions(&client, &config.topic).await?;

        let mut partitions = Vec::with_capacity(ids.len());
        for id in ids {
            let partition_client = client
                .partition_client(config.topic.clone(), id, UnknownTopicHandling::Error)
                .await
                .map_err(|e| {
                    Error::startup(format!("Failed to get partition client {}: {}", id, e))
                })?;
            partitions.push(PartitionSlot {
                id,
                client: Arc::new(partition_client),
            });
        }

        info!(
            brokers = %config.broker_string(),
            topic = %config.topic,
            partitions = partitions.len(),
            "Created Redpanda producer"
        );
        health().redpanda.set_healthy();

        Ok(Self {
            balancer: LeastBytes::new(partitions.len()),
            partitions,
            config,
            healthy: AtomicBool::new(true),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RedpandaConfig {
        &self.config
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.config.request_timeout_ms)
    }

    fn fail(&self, msg: String) -> Error {
        error!(topic = %self.config.topic, "{}", msg);
        self.healthy.store(false, Ordering::Relaxed);
        health().redpanda.set_unhealthy(msg.clone());
        metrics().publish_errors.inc();
        Error::publish(msg)
    }
}

#[async_trait]
impl EventProducer for Producer {
    async fn publish(&self, activity: &Activity) -> Result<PublishReceipt> {
        let payload = activity.to_payload()?;
        let len = payload.len();

        let slot = self
            .partitions
            .get(self.balancer.pick(len))
            .ok_or_else(|| Error::publish("Topic has no partitions"))?;

        let record = Record {
            key: None,
            value: Some(payload),
            headers: BTreeMap::new(),
            timestamp: activity.created_at.unwrap_or_else(Utc::now),
        };

        let start = Instant::now();
        let produced = tokio::time::timeout(
            self.request_timeout(),
            slot.client.produce(vec![record], self.config.compression()),
        )
        .await;

        let offsets = match produced {
            Ok(Ok(offsets)) => offsets,
            Ok(Err(e)) => {
                return Err(self.fail(format!(
                    "Failed to produce to partition {}: {}",
                    slot.id, e
                )))
            }
            Err(_) => {
                return Err(self.fail(format!(
                    "Produce to partition {} timed out after {}ms",
                    slot.id, self.config.request_timeout_ms
                )))
            }
        };

        let offset = offsets
            .first()
            .copied()
            .ok_or_else(|| self.fail("Broker returned no offset".to_string()))?;

        let elapsed = start.elapsed();
        if !self.healthy.swap(true, Ordering::Relaxed) {
            health().redpanda.set_healthy();
        }
        metrics().events_published.inc();
        metrics().publish_latency_ms.observe(elapsed.as_millis() as u64);

        debug!(
            topic = %self.config.topic,
            partition = slot.id,
            offset = offset,
            bytes = len,
            latency_ms = %elapsed.as_millis(),
            "Published activity"
        );

        Ok(PublishReceipt {
            partition: slot.id,
            offset,
        })
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}
