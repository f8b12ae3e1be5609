//! Redpanda configuration.

use activity_core::{Error, Result};
use rskafka::client::partition::Compression;
use serde::{Deserialize, Serialize};

/// Consumer group the workers join.
pub const ACTIVITY_WORKERS_GROUP: &str = "activity-workers";

/// Redpanda connection and topic configuration.
///
/// `brokers` and `topic` have no usable defaults; [`RedpandaConfig::validate`]
/// rejects them when empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedpandaConfig {
    /// Broker addresses (`host:port`)
    #[serde(default)]
    pub brokers: Vec<String>,
    /// Topic carrying activity events
    #[serde(default)]
    pub topic: String,
    /// Compression type (none, gzip, snappy, lz4, zstd)
    #[serde(default = "default_compression")]
    pub compression: String,
    /// Upper bound on a single publish acknowledgement, in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub consumer: ConsumerConfig,
}

/// Consumer-group settings used by the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    #[serde(default = "default_group_id")]
    pub group_id: String,
    /// Where a brand-new group starts reading (earliest, latest)
    #[serde(default = "default_auto_offset_reset")]
    pub auto_offset_reset: String,
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,
    /// Timeout for repositioning after a failed write
    #[serde(default = "default_seek_timeout_ms")]
    pub seek_timeout_ms: u64,
}

fn default_compression() -> String {
    "lz4".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_group_id() -> String {
    ACTIVITY_WORKERS_GROUP.to_string()
}

fn default_auto_offset_reset() -> String {
    "earliest".to_string()
}

fn default_session_timeout_ms() -> u64 {
    30_000
}

fn default_seek_timeout_ms() -> u64 {
    5_000
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            group_id: default_group_id(),
            auto_offset_reset: default_auto_offset_reset(),
            session_timeout_ms: default_session_timeout_ms(),
            seek_timeout_ms: default_seek_timeout_ms(),
        }
    }
}

impl RedpandaConfig {
    pub fn new(brokers: Vec<String>, topic: impl Into<String>) -> Self {
        Self {
            brokers,
            topic: topic.into(),
            compression: default_compression(),
            request_timeout_ms: default_request_timeout_ms(),
            consumer: ConsumerConfig::default(),
        }
    }

    /// Returns the broker list as a comma-separated string.
    pub fn broker_string(&self) -> String {
        self.brokers.join(",")
    }

    /// Checks the required settings.
    pub fn validate(&self) -> Result<()> {
        if self.brokers.iter().all(|b| b.trim().is_empty()) {
            return Err(Error::config("Redpanda broker address is not set"));
        }
        if let Some(bad) = self.brokers.iter().find(|b| !b.contains(':')) {
            return Err(Error::config(format!(
                "Invalid broker address '{}', expected host:port",
                bad
            )));
        }
        if self.topic.trim().is_empty() {
            return Err(Error::config("Redpanda topic is not set"));
        }
        if self.consumer.group_id.trim().is_empty() {
            return Err(Error::config("Consumer group id is empty"));
        }
        Ok(())
    }

    /// Maps the configured compression name onto the wire codec.
    pub fn compression(&self) -> Compression {
        match self.compression.as_str() {
            "gzip" => Compression::Gzip,
            "snappy" => Compression::Snappy,
            "lz4" => Compression::Lz4,
            "zstd" => Compression::Zstd,
            _ => Compression::NoCompression,
        }
    }
}
