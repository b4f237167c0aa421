//! Error types for ShelfKV
//!
//! Provides a unified error type for all operations.
//!
//! A missing key is never an error: reads return `Ok(None)`, `exist` returns
//! `false` and deleting a missing key is a no-op.

use thiserror::Error;

/// Result type alias using ShelfError
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Unified error type for ShelfKV operations
#[derive(Debug, Error)]
pub enum ShelfError {
    // -------------------------------------------------------------------------
    // Filesystem Errors
    // -------------------------------------------------------------------------
    /// A create-dir, rename or delete was refused by the filesystem.
    /// Not retried by the store.
    #[error("Structural error: {0}")]
    Structural(String),

    /// Stream failure while reading or writing a record file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored bytes do not decode to a value.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // -------------------------------------------------------------------------
    // Usage Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ShelfError {
    /// Build a structural error from a failed filesystem call
    pub(crate) fn structural(action: &str, path: &std::path::Path, err: std::io::Error) -> Self {
        ShelfError::Structural(format!("couldn't {} {}: {}", action, path.display(), err))
    }
}
