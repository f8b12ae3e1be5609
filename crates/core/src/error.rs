//! Unified error types for the activity pipeline.
//!
//! Error codes:
//! - VALID_001: request validation errors
//! - QUEUE_001-002: publish and read errors
//! - MSG_001: malformed queue messages
//! - DB_001-002: storage write and query errors
//! - START_001, CONFIG_001: fatal startup errors

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error codes exposed to API callers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// VALID_001: missing, empty or malformed request fields
    Validation,
    /// QUEUE_001: publish to the queue failed
    Publish,
    /// QUEUE_002: read from the queue failed
    Read,
    /// MSG_001: message payload could not be decoded
    Deserialization,
    /// DB_001: storage write failed
    Persist,
    /// DB_002: storage query or row decoding failed
    Query,
    /// START_001: connection or schema provisioning failed at startup
    Startup,
    /// CONFIG_001: missing or invalid configuration
    Config,
    /// INTERNAL_001: anything else
    Internal,
}

impl ErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation => "VALID_001",
            Self::Publish => "QUEUE_001",
            Self::Read => "QUEUE_002",
            Self::Deserialization => "MSG_001",
            Self::Persist => "DB_001",
            Self::Query => "DB_002",
            Self::Startup => "START_001",
            Self::Config => "CONFIG_001",
            Self::Internal => "INTERNAL_001",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation | Self::Deserialization => 400,
            Self::Publish | Self::Read => 503,
            Self::Persist | Self::Query | Self::Startup | Self::Config | Self::Internal => 500,
        }
    }
}

/// Unified error type for the activity pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation error: {message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },

    #[error("publish error: {0}")]
    Publish(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("persist error: {0}")]
    Persist(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("startup error: {0}")]
    Startup(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            details: Vec::new(),
        }
    }

    /// Create a validation error carrying per-field messages.
    pub fn validation_with_details(msg: impl Into<String>, details: Vec<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            details,
        }
    }

    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    pub fn deserialization(msg: impl Into<String>) -> Self {
        Self::Deserialization(msg.into())
    }

    pub fn persist(msg: impl Into<String>) -> Self {
        Self::Persist(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    pub fn startup(msg: impl Into<String>) -> Self {
        Self::Startup(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::Validation,
            Self::Publish(_) => ErrorCode::Publish,
            Self::Read(_) => ErrorCode::Read,
            Self::Deserialization(_) => ErrorCode::Deserialization,
            Self::Persist(_) => ErrorCode::Persist,
            Self::Query(_) => ErrorCode::Query,
            Self::Startup(_) => ErrorCode::Startup,
            Self::Config(_) => ErrorCode::Config,
            Self::Serialization(_) | Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        self.error_code().http_status()
    }

    /// Whether the error must terminate the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Startup(_) | Self::Config(_))
    }
}
