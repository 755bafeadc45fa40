//! Key-value store trait and shared types.
//!
//! This module provides the contract every store backend implements:
//! - `EtcdStore` - etcd v3 over its JSON gateway (default)
//! - `FileStore` - a JSON object file, for local development
//! - `MemoryStore` - in-process map, for tests and embedding

use crate::{Error, Result};
use std::borrow::Cow;
use std::time::Instant;

/// One key/value pair returned by a prefix scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Key as UTF-8, replacing invalid sequences.
    pub fn key_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }

    /// Value as UTF-8, replacing invalid sequences.
    pub fn value_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }
}

/// Trait for stores holding the hierarchical configuration keys.
///
/// Every operation takes a deadline; an operation that cannot finish
/// before it returns [`Error::Timeout`].
pub trait KvStore: Send + Sync {
    /// All pairs whose key starts with `prefix`, in ascending key order.
    fn scan_prefix(&self, prefix: &str, deadline: Instant) -> Result<Vec<KeyValue>>;

    /// Create or overwrite a single key.
    fn put(&self, key: &str, value: &str, deadline: Instant) -> Result<()>;

    /// Delete a single key. Returns the number of keys removed (0 or 1).
    fn delete(&self, key: &str, deadline: Instant) -> Result<u64>;

    /// Get the store location description (for display purposes).
    fn location(&self) -> String;

    /// Which kind of backend this is.
    fn backend_type(&self) -> BackendType;
}

impl<S: KvStore + ?Sized> KvStore for Box<S> {
    fn scan_prefix(&self, prefix: &str, deadline: Instant) -> Result<Vec<KeyValue>> {
        (**self).scan_prefix(prefix, deadline)
    }

    fn put(&self, key: &str, value: &str, deadline: Instant) -> Result<()> {
        (**self).put(key, value, deadline)
    }

    fn delete(&self, key: &str, deadline: Instant) -> Result<u64> {
        (**self).delete(key, deadline)
    }

    fn location(&self) -> String {
        (**self).location()
    }

    fn backend_type(&self) -> BackendType {
        (**self).backend_type()
    }
}

/// Fail with [`Error::Timeout`] once `deadline` has passed.
pub(crate) fn check_deadline(deadline: Instant, operation: &str) -> Result<()> {
    if Instant::now() >= deadline {
        return Err(Error::Timeout(operation.to_string()));
    }
    Ok(())
}

/// Available store backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// etcd v3 JSON gateway (default)
    Etcd,
    /// JSON object file
    File,
    /// In-process map
    Memory,
}

impl BackendType {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Etcd => "etcd",
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_backend_type_display() {
        assert_eq!(BackendType::Etcd.to_string(), "etcd");
        assert_eq!(BackendType::File.as_str(), "file");
        assert_eq!(BackendType::Memory.to_string(), "memory");
    }

    #[test]
    fn test_key_value_lossy_strings() {
        let kv = KeyValue::new(b"/app/N\xffame".to_vec(), "v");
        assert_eq!(kv.key_str(), "/app/N\u{fffd}ame");
        assert_eq!(kv.value_str(), "v");
    }

    #[test]
    fn test_check_deadline() {
        assert!(check_deadline(Instant::now() + Duration::from_secs(5), "scan").is_ok());
        let past = Instant::now() - Duration::from_millis(1);
        assert!(matches!(check_deadline(past, "scan"), Err(Error::Timeout(op)) if op == "scan"));
    }
}
