//! Filesystem-based object store
//!
//! Buckets are directories under a root and keys are relative paths inside
//! them: `{root}/{bucket}/{key}`.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::{ObjectMetadata, ObjectStore, StorageError, StorageLocation};

/// Filesystem-based object store
#[derive(Debug, Clone)]
pub struct FsStore {
    /// Directory holding one subdirectory per bucket
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a location to a path, rejecting anything that escapes the bucket.
    fn object_path(&self, location: &StorageLocation) -> Result<PathBuf, StorageError> {
        let bucket = Path::new(&location.bucket);
        if location.bucket.is_empty() || !is_plain_relative(bucket) || bucket.components().count() != 1
        {
            return Err(StorageError::InvalidLocation(format!(
                "bad bucket name {:?}",
                location.bucket
            )));
        }

        let key = Path::new(&location.key);
        if location.key.is_empty() || location.key.ends_with('/') || !is_plain_relative(key) {
            return Err(StorageError::InvalidLocation(format!(
                "bad object key {:?}",
                location.key
            )));
        }

        Ok(self.root.join(bucket).join(key))
    }
}

fn is_plain_relative(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_)))
}

/// Sibling temp path used to stage a write before the rename.
fn staging_path(path: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.{nanos}.tmp", std::process::id()))
}

impl ObjectStore for FsStore {
    fn get(&self, location: &StorageLocation) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(location)?;

        // Read directly and map ENOENT rather than checking exists() first
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound {
                    bucket: location.bucket.clone(),
                    key: location.key.clone(),
                }
            } else {
                StorageError::Io(e)
            }
        })
    }

    fn put(
        &self,
        location: &StorageLocation,
        body: &[u8],
        metadata: &ObjectMetadata,
    ) -> Result<(), StorageError> {
        metadata.check_length(body)?;
        let path = self.object_path(location)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write the full body beside the target, then rename over it.
        let staging = staging_path(&path);
        let written = fs::File::create(&staging).and_then(|mut file| {
            file.write_all(body)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|_| fs::rename(&staging, &path)) {
            let _ = fs::remove_file(&staging);
            return Err(StorageError::Io(e));
        }

        log::debug!(
            "stored {} ({} bytes, {}) at {}",
            location,
            body.len(),
            metadata.content_type,
            path.display()
        );
        Ok(())
    }
}
