//! Worker startup sequence.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use clickhouse_client::ActivityStore;
use redpanda::MessageSource;
use telemetry::health;
use worker::{ConsumerWorker, WorkerSettings};

/// Provisions the schema, then subscribes, then builds the worker.
///
/// `subscribe` is only called once the schema exists, so a storage failure
/// never joins the consumer group. Errors keep the underlying
/// [`activity_core::Error`] reachable through `downcast_ref`.
pub async fn start_worker<F>(
    store: Arc<dyn ActivityStore>,
    subscribe: F,
    settings: WorkerSettings,
) -> Result<ConsumerWorker>
where
    F: FnOnce() -> activity_core::Result<Arc<dyn MessageSource>>,
{
    store
        .ensure_schema()
        .await
        .context("Failed to provision ClickHouse schema")?;
    health().clickhouse.set_healthy();

    let source = subscribe().context("Failed to create Redpanda consumer")?;
    info!(commit_policy = ?settings.commit_policy, "Worker subscribed");

    Ok(ConsumerWorker::with_config(source, store, settings.into()))
}
