//! Redpanda health checks.

use crate::config::RedpandaConfig;
use activity_core::{Error, Result};
use rskafka::client::{Client, ClientBuilder};
use rskafka::topic::Topic;
use std::time::Duration;
use telemetry::health;
use tracing::{debug, error};

/// Check Redpanda connection health.
///
/// Succeeds when the brokers answer a metadata request within `timeout`.
/// The outcome is recorded in the health registry.
pub async fn check_connection(config: &RedpandaConfig, timeout: Duration) -> bool {
    let probe = async {
        let client = ClientBuilder::new(config.brokers.clone()).build().await?;
        client.list_topics().await
    };

    let healthy = match tokio::time::timeout(timeout, probe).await {
        Ok(Ok(topics)) => {
            debug!(topics = topics.len(), "Redpanda connection healthy");
            true
        }
        Ok(Err(e)) => {
            error!("Redpanda health probe failed: {}", e);
            false
        }
        Err(_) => {
            error!(timeout_ms = %timeout.as_millis(), "Redpanda health probe timed out");
            false
        }
    };

    health().redpanda.record_probe(healthy);
    healthy
}

/// Lists the partition ids of `topic`, in ascending order.
pub async fn topic_partitions(client: &Client, topic: &str) -> Result<Vec<i32>> {
    let topics = client
        .list_topics()
        .await
        .map_err(|e| Error::startup(format!("Failed to list Redpanda topics: {}", e)))?;

    partitions_of(&topics, topic)
}

fn partitions_of(topics: &[Topic], topic: &str) -> Result<Vec<i32>> {
    let found = topics
        .iter()
        .find(|t| t.name == topic)
        .ok_or_else(|| Error::startup(format!("Topic '{}' does not exist", topic)))?;

    if found.partitions.is_empty() {
        return Err(Error::startup(format!("Topic '{}' has no partitions", topic)));
    }

    Ok(found.partitions.iter().copied().collect())
}
