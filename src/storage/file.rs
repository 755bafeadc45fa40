//! JSON file store.
//!
//! The whole store is one JSON object mapping keys to string values. Each
//! operation reads the file, applies the change and writes it back, which is
//! plenty for local development and tests but offers no cross-process locking.

use super::backend::{BackendType, KeyValue, KvStore, check_deadline};
use crate::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn scan_prefix(&self, prefix: &str, deadline: Instant) -> Result<Vec<KeyValue>> {
        check_deadline(deadline, "scan")?;
        Ok(self
            .read_entries()?
            .into_iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| KeyValue::new(k, v))
            .collect())
    }

    fn put(&self, key: &str, value: &str, deadline: Instant) -> Result<()> {
        check_deadline(deadline, "put")?;
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn delete(&self, key: &str, deadline: Instant) -> Result<u64> {
        check_deadline(deadline, "delete")?;
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_none() {
            return Ok(0);
        }
        self.write_entries(&entries)?;
        Ok(1)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn backend_type(&self) -> BackendType {
        BackendType::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::time::Duration;
    use tempfile::TempDir;

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("store.json"));
        assert!(store.scan_prefix("/", deadline()).unwrap().is_empty());
        assert_eq!(store.delete("/nothing", deadline()).unwrap(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_put_scan_delete() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested/store.json"));
        store.put("/app/Name", "svc", deadline()).unwrap();
        store.put("/app/eu/Name", "svc-eu", deadline()).unwrap();
        store.put("/other/Name", "x", deadline()).unwrap();

        let scanned = store.scan_prefix("/app", deadline()).unwrap();
        assert_eq!(scanned.len(), 2);
        assert_eq!(scanned[0].key_str(), "/app/Name");

        assert_eq!(store.delete("/app/Name", deadline()).unwrap(), 1);
        let reopened = FileStore::new(store.path());
        assert_eq!(reopened.scan_prefix("/app", deadline()).unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(
            store.scan_prefix("/", deadline()),
            Err(Error::Json(_))
        ));
    }
}
