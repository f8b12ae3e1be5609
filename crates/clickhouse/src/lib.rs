//! ClickHouse storage sink for activity events.

pub mod client;
pub mod config;
pub mod health;
pub mod schema;
pub mod store;

pub use client::*;
pub use config::*;
pub use store::ActivityStore;
