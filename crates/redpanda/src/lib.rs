//! Redpanda access for the activity pipeline.
//!
//! - [`Producer`]: shared publisher with a least-bytes partition balancer
//! - [`Consumer`]: consumer-group subscription used by the worker
//! - [`MessageSource`] / [`EventProducer`]: seams the api and worker depend on

pub mod config;
pub mod consumer;
pub mod health;
pub mod message;
pub mod partitioner;
pub mod producer;

pub use config::*;
pub use consumer::*;
pub use message::*;
pub use partitioner::LeastBytes;
pub use producer::*;
