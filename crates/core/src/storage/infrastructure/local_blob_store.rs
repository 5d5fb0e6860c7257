use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::storage::domain::blob_store::{compose_key, Blob, BlobIter, BlobStore, StoreError};

/// Blob store over a local directory tree.
///
/// Store paths are `/`-separated and relative to `base`. Objects under a
/// root are the regular files directly inside `<base>/<root>`, listed in
/// name order and keyed as `<root-dir-name>,<file-name>`. Files whose name
/// contains the key separator are listed as unkeyable and never read.
pub struct LocalBlobStore {
    base: PathBuf,
}

impl LocalBlobStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.base.clone(), |acc, part| acc.join(part))
    }
}

impl BlobStore for LocalBlobStore {
    fn entries(&self, root: &str) -> Result<BlobIter<'_>, StoreError> {
        let dir = self.resolve(root);
        let list_err = |source| StoreError::List {
            root: root.to_string(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            if entry.file_type().map_err(list_err)?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();

        let batch = batch_name(&dir, root);
        log::debug!("Listed {} objects under {}", files.len(), dir.display());

        Ok(Box::new(files.into_iter().map(move |path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let key = compose_key(&batch, &name)?;
            match fs::read(&path) {
                Ok(bytes) => Ok(Blob { key, bytes }),
                Err(source) => Err(StoreError::Read { key, source }),
            }
        })))
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let target = self.resolve(path);
        let write_err = |source| StoreError::Write {
            path: path.to_string(),
            source,
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let mut file = fs::File::create(&target).map_err(write_err)?;
        file.write_all(bytes).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        Ok(())
    }
}

fn batch_name(dir: &Path, root: &str) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(base: &Path, root: &str, files: &[(&str, &[u8])]) {
        let dir = base.join(root);
        fs::create_dir_all(&dir).unwrap();
        for (name, bytes) in files {
            fs::write(dir.join(name), bytes).unwrap();
        }
    }

    #[test]
    fn test_entries_keys_and_order() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path(), "batch1", &[("b.jpg", b"bbb"), ("a.jpg", b"aa")]);
        let store = LocalBlobStore::new(tmp.path());

        let blobs: Vec<Blob> = store
            .entries("batch1")
            .unwrap()
            .map(|b| b.unwrap())
            .collect();

        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].key, "batch1,a.jpg");
        assert_eq!(blobs[0].bytes, b"aa");
        assert_eq!(blobs[1].key, "batch1,b.jpg");
    }

    #[test]
    fn test_separator_in_file_name_is_per_entry_error() {
        let tmp = tempfile::tempdir().unwrap();
        seed(
            tmp.path(),
            "batch1",
            &[("party,2024.jpg", b"a"), ("party,2025.jpg", b"b"), ("solo.jpg", b"c")],
        );
        let store = LocalBlobStore::new(tmp.path());

        let items: Vec<_> = store.entries("batch1").unwrap().collect();
        assert_eq!(items.len(), 3);
        let subjects: Vec<String> = items
            .iter()
            .filter_map(|item| match item {
                Err(e @ StoreError::Unkeyable { .. }) => Some(e.subject().to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(subjects, vec!["batch1/party,2024.jpg", "batch1/party,2025.jpg"]);
        assert_eq!(items[2].as_ref().unwrap().key, "batch1,solo.jpg");
    }

    #[test]
    fn test_entries_skips_subdirectories() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path(), "in", &[("x.png", b"x")]);
        fs::create_dir_all(tmp.path().join("in").join("nested")).unwrap();
        let store = LocalBlobStore::new(tmp.path());

        assert_eq!(store.entries("in").unwrap().count(), 1);
    }

    #[test]
    fn test_missing_root_is_list_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(tmp.path());
        let err = store.entries("absent").err().unwrap();
        assert!(matches!(err, StoreError::List { .. }));
        assert_eq!(err.subject(), "absent");
    }

    #[test]
    fn test_read_all_materializes() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path(), "in", &[("1.jpg", b"1"), ("2.jpg", b"2"), ("3.jpg", b"3")]);
        let store = LocalBlobStore::new(tmp.path());
        let all = store.read_all("in").unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn test_write_creates_parents_and_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(tmp.path());

        store.write("out/deep/photo7.jpg", b"first").unwrap();
        store.write("out/deep/photo7.jpg", b"second").unwrap();

        let written = fs::read(tmp.path().join("out").join("deep").join("photo7.jpg")).unwrap();
        assert_eq!(written, b"second");
    }

    #[test]
    fn test_write_into_file_path_fails() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("blocker"), b"x").unwrap();
        let store = LocalBlobStore::new(tmp.path());
        let err = store.write("blocker/out.jpg", b"data").unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }

    #[test]
    fn test_written_object_is_listed_under_its_root() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(tmp.path());
        store.write("results/a.jpg", b"img").unwrap();
        let blobs = store.read_all("results/").unwrap();
        assert_eq!(blobs[0].as_ref().unwrap().key, "results,a.jpg");
    }
}
