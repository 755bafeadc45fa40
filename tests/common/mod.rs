//! Common test utilities for ecfg integration tests.
//!
//! Provides `TestEnv`, which points ecfg at a JSON file store in a
//! temporary directory so tests never touch a real etcd cluster.

#![allow(dead_code)]

use assert_cmd::Command;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A test environment with an isolated file store.
///
/// The `ecfg()` method returns a `Command` with `ECFG_STORE_FILE` set and
/// the `ETCD_*` bootstrap variables cleared, per invocation, so tests are
/// parallel-safe.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an empty store.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Create a test environment whose store holds `pairs`.
    pub fn with_keys(pairs: &[(&str, &str)]) -> Self {
        let env = Self::new();
        let entries: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        std::fs::write(env.store_path(), serde_json::to_string(&entries).unwrap()).unwrap();
        env
    }

    /// Path of the JSON store file.
    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("store.json")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Current store contents.
    pub fn keys(&self) -> BTreeMap<String, String> {
        match std::fs::read_to_string(self.store_path()) {
            Ok(text) if !text.trim().is_empty() => serde_json::from_str(&text).unwrap(),
            _ => BTreeMap::new(),
        }
    }

    /// Get a Command for the ecfg binary bound to this store.
    pub fn ecfg(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_ecfg"));
        cmd.current_dir(self.dir.path());
        cmd.env("ECFG_STORE_FILE", self.store_path());
        for var in [
            "ETCD_ADDRESS",
            "ETCD_PATH",
            "ETCD_DELETE_UNUSED",
            "ETCD_SESSION_TIMEOUT",
            "ECFG_LOG",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
