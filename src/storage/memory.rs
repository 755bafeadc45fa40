//! In-process store.
//!
//! Clones share the same map, so a test can hand one clone to a
//! [`Configurer`](crate::Configurer) and inspect the other.

use super::backend::{BackendType, KeyValue, KvStore, check_deadline};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `pairs`.
    pub fn with_entries<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    /// Current value of `key`, without a deadline.
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().ok()?.get(key).cloned()
    }

    /// Copy of the whole map.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().map(|m| m.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Poisoned("memory store".to_string()))
    }
}

impl KvStore for MemoryStore {
    fn scan_prefix(&self, prefix: &str, deadline: Instant) -> Result<Vec<KeyValue>> {
        check_deadline(deadline, "scan")?;
        let entries = self.lock()?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| KeyValue::new(k.as_bytes(), v.as_bytes()))
            .collect())
    }

    fn put(&self, key: &str, value: &str, deadline: Instant) -> Result<()> {
        check_deadline(deadline, "put")?;
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str, deadline: Instant) -> Result<u64> {
        check_deadline(deadline, "delete")?;
        Ok(u64::from(self.lock()?.remove(key).is_some()))
    }

    fn location(&self) -> String {
        "memory".to_string()
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[test]
    fn test_scan_prefix_is_ordered_and_bounded() {
        let store = MemoryStore::with_entries([
            ("/app/b", "2"),
            ("/app/a", "1"),
            ("/apx/c", "3"),
            ("/ap", "0"),
        ]);
        let keys: Vec<_> = store
            .scan_prefix("/app/", deadline())
            .unwrap()
            .iter()
            .map(|kv| kv.key_str().into_owned())
            .collect();
        assert_eq!(keys, vec!["/app/a", "/app/b"]);
    }

    #[test]
    fn test_clones_share_state() {
        let store = MemoryStore::new();
        let observer = store.clone();
        store.put("/k", "v", deadline()).unwrap();
        assert_eq!(observer.get("/k").as_deref(), Some("v"));
        assert_eq!(store.delete("/k", deadline()).unwrap(), 1);
        assert_eq!(store.delete("/k", deadline()).unwrap(), 0);
        assert!(observer.snapshot().is_empty());
    }

    #[test]
    fn test_expired_deadline_times_out() {
        let store = MemoryStore::new();
        let past = Instant::now() - Duration::from_millis(1);
        assert!(matches!(store.put("/k", "v", past), Err(Error::Timeout(_))));
        assert!(store.get("/k").is_none());
    }
}
