//! Activity persistence on ClickHouse.

use crate::client::ClickHouseClient;
use crate::schema::{ACTIVITIES_TABLE, CREATE_ACTIVITIES_TABLE, SELECT_ACTIVITIES};
use activity_core::{Activity, Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clickhouse::Row;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, error, info};

/// Append-only activity storage.
///
/// Shared by request handlers and the worker, so implementations must be
/// safe for concurrent use.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Creates the activities table if it does not exist.
    async fn ensure_schema(&self) -> Result<()>;

    /// Appends one row.
    async fn insert_activity(&self, activity: &Activity) -> Result<()>;

    /// Returns every row, newest first.
    async fn list_activities(&self) -> Result<Vec<Activity>>;

    /// Whether the store answers a trivial query.
    async fn ping(&self) -> bool;
}

/// Row without `created_at`, so the column default applies.
#[derive(Debug, Clone, Row, Serialize)]
struct NewActivityRow {
    user_id: String,
    action: String,
}

/// Row with an explicit `created_at` (seconds since epoch).
#[derive(Debug, Clone, Row, Serialize)]
struct TimestampedActivityRow {
    user_id: String,
    action: String,
    created_at: u32,
}

/// Row as read back by the query endpoint.
#[derive(Debug, Clone, Row, Deserialize)]
struct ActivityRecord {
    user_id: String,
    action: String,
    created_at: u32,
}

impl From<ActivityRecord> for Activity {
    fn from(row: ActivityRecord) -> Self {
        Activity {
            user_id: row.user_id,
            action: row.action,
            created_at: DateTime::<Utc>::from_timestamp(i64::from(row.created_at), 0),
        }
    }
}

fn to_datetime_secs(ts: &DateTime<Utc>) -> Result<u32> {
    u32::try_from(ts.timestamp())
        .map_err(|_| Error::persist(format!("created_at {} is out of range", ts.to_rfc3339())))
}

impl ClickHouseClient {
    async fn write_one<T>(&self, row: &T) -> clickhouse::error::Result<()>
    where
        T: Row + Serialize,
    {
        let mut insert = self.inner().insert::<T>(ACTIVITIES_TABLE)?;
        insert.write(row).await?;
        insert.end().await
    }

    async fn write_row(&self, activity: &Activity) -> Result<()> {
        let written = match activity.created_at {
            None => {
                self.write_one(&NewActivityRow {
                    user_id: activity.user_id.clone(),
                    action: activity.action.clone(),
                })
                .await
            }
            Some(ts) => {
                self.write_one(&TimestampedActivityRow {
                    user_id: activity.user_id.clone(),
                    action: activity.action.clone(),
                    created_at: to_datetime_secs(&ts)?,
                })
                .await
            }
        };
        written.map_err(|e| Error::persist(e.to_string()))
    }
}

#[async_trait]
impl ActivityStore for ClickHouseClient {
    async fn ensure_schema(&self) -> Result<()> {
        self.inner()
            .query(CREATE_ACTIVITIES_TABLE)
            .execute()
            .await
            .map_err(|e| Error::startup(format!("Failed to create activities table: {}", e)))?;

        info!(table = ACTIVITIES_TABLE, "ClickHouse schema ready");
        Ok(())
    }

    async fn insert_activity(&self, activity: &Activity) -> Result<()> {
        let start = Instant::now();

        if let Err(e) = self.write_row(activity).await {
            metrics().persist_errors.inc();
            error!(user_id = %activity.user_id, "Failed to insert activity: {}", e);
            return Err(e);
        }

        let elapsed = start.elapsed();
        metrics().events_persisted.inc();
        metrics().persist_latency_ms.observe(elapsed.as_millis() as u64);
        debug!(
            user_id = %activity.user_id,
            action = %activity.action,
            latency_ms = %elapsed.as_millis(),
            "Inserted activity"
        );
        Ok(())
    }

    async fn list_activities(&self) -> Result<Vec<Activity>> {
        let start = Instant::now();
        metrics().activity_queries.inc();

        let result = async {
            let mut cursor = self.inner().query(SELECT_ACTIVITIES).fetch::<ActivityRecord>()?;
            let mut activities = Vec::new();
            while let Some(row) = cursor.next().await? {
                activities.push(Activity::from(row));
            }
            Ok::<_, clickhouse::error::Error>(activities)
        }
        .await;

        match result {
            Ok(activities) => {
                metrics()
                    .query_latency_ms
                    .observe(start.elapsed().as_millis() as u64);
                debug!(rows = activities.len(), "Listed activities");
                Ok(activities)
            }
            Err(e) => {
                metrics().query_errors.inc();
                error!("Failed to list activities: {}", e);
                Err(Error::query(e.to_string()))
            }
        }
    }

    async fn ping(&self) -> bool {
        crate::health::check_connection(self).await
    }
}
