//! Core types, validation, and error taxonomy for the StreamTrack activity pipeline.

pub mod activity;
pub mod error;
pub mod limits;

pub use activity::*;
pub use error::{Error, ErrorCode, Result};
