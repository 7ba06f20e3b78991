//! Error types for chanlease
//!
//! Provides a unified error type for all operations.
//!
//! Losing leadership is NOT an error: `refresh`/`release` report it as
//! `Ok(false)`, and an absent lease is `Ok(None)` from `inspect`.

use thiserror::Error;

/// Result type alias using LeaderError
pub type Result<T> = std::result::Result<T, LeaderError>;

/// Unified error type for chanlease operations
#[derive(Debug, Error)]
pub enum LeaderError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    /// The store could not be reached, or stopped answering mid-call.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] std::io::Error),

    /// The store answered with an error reply.
    #[error("Store rejected request: {0}")]
    StoreRejected(String),

    /// The store answered, but not in the shape the procedure promises.
    #[error("Malformed result: {0}")]
    MalformedResult(String),

    // -------------------------------------------------------------------------
    // Wire Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Caller Context
    // -------------------------------------------------------------------------
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,
}

impl LeaderError {
    /// True when the leadership status is unknown because the store could
    /// not be consulted in time. Callers should assume they are not leader.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(
            self,
            LeaderError::StoreUnavailable(_) | LeaderError::DeadlineExceeded
        )
    }

    /// True for protocol-shape defects (version skew, misconfiguration).
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            LeaderError::MalformedResult(_) | LeaderError::Protocol(_) | LeaderError::Serialization(_)
        )
    }
}

impl From<bincode::Error> for LeaderError {
    fn from(e: bincode::Error) -> Self {
        LeaderError::Serialization(e.to_string())
    }
}
