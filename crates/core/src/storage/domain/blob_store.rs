use thiserror::Error;

use crate::shared::constants::KEY_SEPARATOR;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to list {root}: {source}")]
    List {
        root: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {key}: {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot key {path}: name contains the key separator ','")]
    Unkeyable { path: String },
}

impl StoreError {
    /// The root, key, or path the failed operation addressed.
    pub fn subject(&self) -> &str {
        match self {
            StoreError::List { root, .. } => root,
            StoreError::Read { key, .. } => key,
            StoreError::Write { path, .. } => path,
            StoreError::Unkeyable { path } => path,
        }
    }
}

/// Builds the composite `<batch>,<name>` key of a listed object.
///
/// Either part containing the separator would shift field 1 away from the
/// object name, so such objects get [`StoreError::Unkeyable`] instead.
pub fn compose_key(batch: &str, name: &str) -> Result<String, StoreError> {
    if batch.contains(KEY_SEPARATOR) || name.contains(KEY_SEPARATOR) {
        return Err(StoreError::Unkeyable {
            path: format!("{batch}/{name}"),
        });
    }
    Ok(format!("{batch}{KEY_SEPARATOR}{name}"))
}

/// One stored object: its composite key and raw bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub key: String,
    pub bytes: Vec<u8>,
}

pub type BlobIter<'a> = Box<dyn Iterator<Item = Result<Blob, StoreError>> + Send + 'a>;

/// Path-addressed object store the pipeline reads inputs from and writes
/// annotated outputs to.
pub trait BlobStore: Send + Sync {
    /// Lazily yields every object directly under `root`, in a stable order.
    ///
    /// Failing to list `root` is an error of the whole call; failing to read
    /// one object is an error of that item only.
    fn entries(&self, root: &str) -> Result<BlobIter<'_>, StoreError>;

    /// Creates or overwrites the object at `path`; durable once this returns.
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Materializes every object under `root` before returning.
    fn read_all(&self, root: &str) -> Result<Vec<Result<Blob, StoreError>>, StoreError> {
        Ok(self.entries(root)?.collect())
    }
}
