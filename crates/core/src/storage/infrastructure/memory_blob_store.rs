use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use crate::storage::domain::blob_store::{compose_key, Blob, BlobIter, BlobStore, StoreError};

/// In-process blob store keyed by `/`-separated paths.
///
/// Listing follows [`super::local_blob_store::LocalBlobStore`]: direct
/// children of a root, in path order, keyed `<root-name>,<object-name>`.
/// Writes to paths registered with [`MemoryBlobStore::fail_writes_to`] fail
/// with an I/O error.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    failing_writes: Mutex<HashSet<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: &str, bytes: Vec<u8>) {
        self.lock_objects().insert(normalize(path), bytes);
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.lock_objects().get(&normalize(path)).cloned()
    }

    /// Every stored path, in order.
    pub fn paths(&self) -> Vec<String> {
        self.lock_objects().keys().cloned().collect()
    }

    pub fn fail_writes_to(&self, path: &str) {
        self.failing_writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(normalize(path));
    }

    fn lock_objects(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl BlobStore for MemoryBlobStore {
    fn entries(&self, root: &str) -> Result<BlobIter<'_>, StoreError> {
        let root = normalize(root);
        let prefix = format!("{root}/");
        let batch = root.rsplit('/').next().unwrap_or_default().to_string();

        let blobs: Vec<Result<Blob, StoreError>> = self
            .lock_objects()
            .iter()
            .filter_map(|(path, bytes)| {
                let name = path.strip_prefix(&prefix)?;
                if name.contains('/') {
                    return None;
                }
                Some(compose_key(&batch, name).map(|key| Blob {
                    key,
                    bytes: bytes.clone(),
                }))
            })
            .collect();

        Ok(Box::new(blobs.into_iter()))
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = normalize(path);
        let failing = self
            .failing_writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&path);
        if failing {
            return Err(StoreError::Write {
                path,
                source: std::io::Error::other("storage unreachable"),
            });
        }
        self.lock_objects().insert(path, bytes.to_vec());
        Ok(())
    }
}

fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
