//! In-memory object store.
//!
//! Used by tests and by callers that embed the handlers without a real
//! backend. A put replaces the map entry under one lock, so it is atomic.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{ObjectMetadata, ObjectStore, StorageError, StorageLocation};

/// An object as held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub metadata: ObjectMetadata,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<StorageLocation, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object directly, bypassing metadata checks.
    pub fn insert(&self, location: StorageLocation, body: Vec<u8>, content_type: &str) {
        let metadata = ObjectMetadata::for_body(&body, content_type);
        self.lock().insert(location, StoredObject { body, metadata });
    }

    /// Copy of the object at `location`, if any.
    pub fn object(&self, location: &StorageLocation) -> Option<StoredObject> {
        self.lock().get(location).cloned()
    }

    /// Keys present in `bucket`, in lexical order.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .keys()
            .filter(|loc| loc.bucket == bucket)
            .map(|loc| loc.key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<StorageLocation, StoredObject>> {
        // A poisoned map still holds complete entries; keep serving it.
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ObjectStore for MemoryStore {
    fn get(&self, location: &StorageLocation) -> Result<Vec<u8>, StorageError> {
        self.lock()
            .get(location)
            .map(|obj| obj.body.clone())
            .ok_or_else(|| StorageError::NotFound {
                bucket: location.bucket.clone(),
                key: location.key.clone(),
            })
    }

    fn put(
        &self,
        location: &StorageLocation,
        body: &[u8],
        metadata: &ObjectMetadata,
    ) -> Result<(), StorageError> {
        metadata.check_length(body)?;
        self.lock().insert(
            location.clone(),
            StoredObject {
                body: body.to_vec(),
                metadata: metadata.clone(),
            },
        );
        log::debug!("stored {} ({} bytes)", location, body.len());
        Ok(())
    }
}
