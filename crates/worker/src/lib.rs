//! Consumer worker for the activity pipeline.
//!
//! Reads one message at a time from the `activity-workers` consumer group,
//! decodes it, and appends it to ClickHouse. Shutdown is cooperative through
//! a [`tokio_util::sync::CancellationToken`].

pub mod consumer;

pub use consumer::*;
