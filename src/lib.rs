//! StreamTrack: user-activity tracking pipeline.
//!
//! Two processes share this crate:
//! - `streamtrack-api`: `POST /track` ingress and `GET /activities` query
//! - `streamtrack-worker`: Redpanda → ClickHouse consumer
//!
//! Configuration loading and process startup live here; the pipeline itself
//! is in the workspace crates.

pub mod config;
pub mod shutdown;
pub mod startup;

pub use config::{load_config, AppConfig};
pub use shutdown::{cancel_on_signal, shutdown_signal};
pub use startup::start_worker;
