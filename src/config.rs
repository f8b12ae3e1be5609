//! Process configuration.
//!
//! Layers, lowest precedence first:
//! 1. serialized defaults
//! 2. `config/default.toml` (optional)
//! 3. `STREAMTRACK__SECTION__KEY` environment variables
//! 4. the conventional `KAFKA_BROKER`, `KAFKA_TOPIC`, `CLICKHOUSE_ADDR`

use activity_core::{Error, Result as CoreResult};
use anyhow::{Context, Result};
use clickhouse_client::ClickHouseConfig;
use redpanda::RedpandaConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use worker::WorkerSettings;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub redpanda: RedpandaConfig,

    #[serde(default)]
    pub clickhouse: ClickHouseConfig,

    #[serde(default)]
    pub worker: WorkerSettings,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            redpanda: RedpandaConfig::default(),
            clickhouse: ClickHouseConfig::default(),
            worker: WorkerSettings::default(),
        }
    }
}

impl AppConfig {
    /// Checks every required setting.
    pub fn validate(&self) -> CoreResult<()> {
        self.redpanda.validate()?;
        self.clickhouse.validate()?;
        self.listen_addr()?;
        Ok(())
    }

    /// Address the HTTP server binds to.
    pub fn listen_addr(&self) -> CoreResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::config(format!("Invalid listen address: {}", e)))
    }

    /// Applies the conventional deployment variables on top of the layered
    /// configuration.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(brokers) = lookup("KAFKA_BROKER") {
            self.redpanda.brokers = split_list(&brokers);
        }
        if let Some(topic) = lookup("KAFKA_TOPIC") {
            self.redpanda.topic = topic.trim().to_string();
        }
        if let Some(addr) = lookup("CLICKHOUSE_ADDR") {
            self.clickhouse.url = addr.trim().to_string();
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load configuration from files and environment.
pub fn load_config() -> Result<AppConfig> {
    let layered = ::config::Config::builder()
        .add_source(::config::Config::try_from(&AppConfig::default())?)
        .add_source(
            ::config::File::with_name("config/default")
                .required(false)
                .format(::config::FileFormat::Toml),
        )
        .add_source(
            ::config::Environment::with_prefix("STREAMTRACK")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("redpanda.brokers")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: AppConfig = layered
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    config.apply_overrides(|key| std::env::var(key).ok());

    Ok(config)
}
