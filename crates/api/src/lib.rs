//! HTTP API layer for the activity pipeline.
//!
//! - `POST /track`: validate and publish one activity event
//! - `GET /activities`: read back persisted events, newest first
//! - `GET /health`, `/health/ready`, `/health/live`

pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
