//! Storage error types

use thiserror::Error;

/// Errors from object storage backends
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Invalid object address: {0}")]
    InvalidLocation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}
