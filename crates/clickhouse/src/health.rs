//! ClickHouse health checks.

use crate::client::ClickHouseClient;
use telemetry::health;
use tracing::{debug, error};

/// Check ClickHouse connection health and record the outcome.
pub async fn check_connection(client: &ClickHouseClient) -> bool {
    let healthy = match client.inner().query("SELECT 1").fetch_one::<u8>().await {
        Ok(_) => {
            debug!("ClickHouse connection healthy");
            true
        }
        Err(e) => {
            error!("ClickHouse health check failed: {}", e);
            false
        }
    };

    health().clickhouse.record_probe(healthy);
    healthy
}
