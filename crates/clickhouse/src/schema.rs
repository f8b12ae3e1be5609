//! ClickHouse table schema.

/// Table holding one row per persisted activity event.
pub const ACTIVITIES_TABLE: &str = "activities";

/// Idempotent DDL for the activities table.
///
/// Rows are physically ordered by `created_at`; an insert that omits the
/// column gets the server clock.
pub const CREATE_ACTIVITIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS activities (
    user_id String,
    action String,
    created_at DateTime DEFAULT now()
) ENGINE = MergeTree()
ORDER BY created_at
"#;

/// Full scan used by the query endpoint.
pub const SELECT_ACTIVITIES: &str =
    "SELECT ?fields FROM activities ORDER BY created_at DESC";
