//! Store layer for configuration keys.
//!
//! ## Store Backends
//!
//! - **etcd** (default): etcd v3 through its JSON gateway
//! - **file**: a single JSON object file, for local development
//! - **memory**: an in-process map, for tests and embedding
//!
//! All backends return prefix scans in ascending key order and use `/` as
//! the hierarchy separator.

pub mod backend;
pub mod etcd;
pub mod file;
pub mod memory;

pub use backend::{BackendType, KeyValue, KvStore};
pub use etcd::EtcdStore;
pub use file::FileStore;
pub use memory::MemoryStore;

use crate::Result;
use crate::config::BootstrapConfig;
use std::path::Path;

/// Open the store selected by the bootstrap settings.
///
/// A `store_file` takes precedence over the etcd endpoints.
pub fn open_store(bootstrap: &BootstrapConfig, store_file: Option<&Path>) -> Result<Box<dyn KvStore>> {
    match store_file {
        Some(path) => Ok(Box::new(FileStore::new(path))),
        None => Ok(Box::new(EtcdStore::connect(
            &bootstrap.endpoints,
            bootstrap.session_timeout,
        )?)),
    }
}
