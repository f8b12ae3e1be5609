//! StreamTrack consumer worker.
//!
//! Exits non-zero when storage, schema or subscription setup fails.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use clickhouse_client::{ActivityStore, ClickHouseClient};
use redpanda::{Consumer, MessageSource};
use streamtrack::{cancel_on_signal, load_config, start_worker};
use telemetry::{health, init_tracing_from_env, metrics};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing_from_env("streamtrack-worker");

    info!("Starting StreamTrack worker v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    config.validate().context("Invalid configuration")?;

    let store: Arc<dyn ActivityStore> = Arc::new(
        ClickHouseClient::new(config.clickhouse.clone())
            .context("Failed to create ClickHouse client")?,
    );
    let worker = start_worker(
        store,
        || Ok(Arc::new(Consumer::new(&config.redpanda)?) as Arc<dyn MessageSource>),
        config.worker.clone(),
    )
    .await?;

    redpanda::health::check_connection(&config.redpanda, PROBE_TIMEOUT).await;
    info!(status = health().report().status.as_str(), "Startup health check");

    let shutdown = CancellationToken::new();
    let signal_task = cancel_on_signal(shutdown.clone());

    let stats = worker.run(shutdown).await;
    signal_task.abort();

    let snapshot = metrics().snapshot();
    info!(
        consumed = stats.consumed,
        persisted = stats.persisted,
        discarded = stats.discarded,
        rewound = stats.rewound,
        lost = stats.lost,
        read_errors = stats.read_errors,
        persist_latency_mean_ms = snapshot.persist_latency_mean_ms,
        "Shutdown complete"
    );
    Ok(())
}
