//! StreamTrack ingress and query server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use api::{router, AppState};
use clickhouse_client::ClickHouseClient;
use redpanda::Producer;
use streamtrack::{load_config, shutdown_signal};
use telemetry::{health, init_tracing_from_env};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing_from_env("streamtrack-api");

    info!("Starting StreamTrack API v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    config.validate().context("Invalid configuration")?;
    let addr = config.listen_addr()?;

    info!(
        brokers = ?config.redpanda.brokers,
        topic = %config.redpanda.topic,
        clickhouse = %config.clickhouse.url,
        "Loaded configuration"
    );

    let producer = Arc::new(
        Producer::new(config.redpanda.clone())
            .await
            .context("Failed to create Redpanda producer")?,
    );

    let clickhouse = Arc::new(
        ClickHouseClient::new(config.clickhouse.clone())
            .context("Failed to create ClickHouse client")?,
    );

    redpanda::health::check_connection(&config.redpanda, PROBE_TIMEOUT).await;
    if !clickhouse_client::health::check_connection(&clickhouse).await {
        warn!("ClickHouse unreachable, GET /activities will fail until it recovers");
    }
    info!(status = health().report().status.as_str(), "Startup health check");

    let app = router(AppState::new(producer, clickhouse));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}
