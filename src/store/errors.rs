//! # Store Errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by the key-value store collaborator.
///
/// These pass through the query layer unchanged and are never retried.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Connection could not be opened
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Credentials rejected by the store
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Store handle was closed
    #[error("Store is closed")]
    Closed,

    /// Value cannot be used as a key part
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::ConnectionFailed(_) => "AEROKV_STORE_CONNECTION_FAILED",
            StoreError::Unauthorized(_) => "AEROKV_STORE_UNAUTHORIZED",
            StoreError::Closed => "AEROKV_STORE_CLOSED",
            StoreError::InvalidKey(_) => "AEROKV_STORE_INVALID_KEY",
            StoreError::Serialization(_) => "AEROKV_STORE_SERIALIZATION",
            StoreError::IoError(_) => "AEROKV_STORE_IO",
            StoreError::Internal(_) => "AEROKV_STORE_INTERNAL",
        }
    }
}
