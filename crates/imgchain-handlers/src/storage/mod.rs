//! Object storage seam.
//!
//! Handlers never construct a client themselves; they receive an
//! [`ObjectStore`] and address objects by [`StorageLocation`].

mod error;
mod filesystem;
mod memory;

use std::fmt;

pub use error::StorageError;
pub use filesystem::FsStore;
pub use memory::{MemoryStore, StoredObject};

/// A (bucket, key) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageLocation {
    pub bucket: String,
    pub key: String,
}

impl StorageLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Portion of the key after the last `/`.
    pub fn filename(&self) -> &str {
        basename(&self.key)
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Portion of an object key after the last `/`, or the whole key if it has none.
pub fn basename(key: &str) -> &str {
    match key.rfind('/') {
        Some(idx) => &key[idx + 1..],
        None => key,
    }
}

/// Metadata attached to a put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Exact body length in bytes.
    pub content_length: u64,
    pub content_type: String,
}

impl ObjectMetadata {
    /// Metadata describing `body` with the given content type.
    pub fn for_body(body: &[u8], content_type: &str) -> Self {
        Self {
            content_length: body.len() as u64,
            content_type: content_type.to_string(),
        }
    }

    pub(crate) fn check_length(&self, body: &[u8]) -> Result<(), StorageError> {
        if self.content_length != body.len() as u64 {
            return Err(StorageError::Backend(format!(
                "content length {} does not match body of {} bytes",
                self.content_length,
                body.len()
            )));
        }
        Ok(())
    }
}

/// Trait for object storage backends.
///
/// Implementations must be thread-safe so a host can run invocations
/// concurrently. A `put` must be atomic: readers observe either the previous
/// object (or nothing) or the complete new body.
pub trait ObjectStore: Send + Sync {
    /// Read a whole object.
    fn get(&self, location: &StorageLocation) -> Result<Vec<u8>, StorageError>;

    /// Write a whole object, replacing any existing one.
    fn put(
        &self,
        location: &StorageLocation,
        body: &[u8],
        metadata: &ObjectMetadata,
    ) -> Result<(), StorageError>;
}
