//! Command implementations for the ecfg CLI.
//!
//! Each command returns a serializable result; `main` prints it as JSON or
//! as human-readable text.
//! - `env` - resolved bootstrap settings
//! - `scan` / `resolve` - read-only views of a key prefix
//! - `put` / `delete` - single-key writes
//! - `prune` - the prune pass over an explicit name set

use crate::config::ResolvedBootstrap;
use crate::resolver::{Candidate, resolve_winners};
use crate::storage::KvStore;
use crate::sync::prune_unused;
use crate::{Error, Result};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

fn deadline(timeout: Duration) -> Instant {
    Instant::now() + timeout
}

// === env ===

#[derive(Serialize)]
pub struct EnvResult {
    pub store: String,
    #[serde(flatten)]
    pub resolved: ResolvedBootstrap,
}

impl Output for EnvResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let r = &self.resolved;
        let mut lines = vec![
            format!("store:           {}", self.store),
            format!(
                "endpoints:       {} ({})",
                r.endpoints.value.join(","),
                r.endpoints.source
            ),
            format!("root path:       {} ({})", r.root_path.value, r.root_path.source),
            format!(
                "delete unused:   {} ({})",
                r.delete_unused.value, r.delete_unused.source
            ),
            format!(
                "session timeout: {} ({})",
                crate::value::format_duration(r.session_timeout.value),
                r.session_timeout.source
            ),
        ];
        for warning in &r.warnings {
            lines.push(format!("warning: {}", warning));
        }
        lines.join("\n")
    }
}

/// Report the resolved bootstrap settings.
pub fn env(resolved: ResolvedBootstrap, store: &dyn KvStore) -> EnvResult {
    EnvResult {
        store: format!("{} {}", store.backend_type(), store.location()),
        resolved,
    }
}

// === scan ===

#[derive(Serialize)]
pub struct ScanResult {
    pub prefix: String,
    pub count: usize,
    pub keys: Vec<Candidate>,
}

impl Output for ScanResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.keys.is_empty() {
            return format!("No keys under {}", self.prefix);
        }
        let mut lines = vec![format!("{} key(s) under {}:", self.count, self.prefix)];
        for c in &self.keys {
            lines.push(format!("  [{}] {} = {:?}", c.depth, c.key, c.value));
        }
        lines.join("\n")
    }
}

/// List every key under `prefix`.
pub fn scan(store: &dyn KvStore, prefix: &str, timeout: Duration) -> Result<ScanResult> {
    let keys: Vec<Candidate> = store
        .scan_prefix(prefix, deadline(timeout))?
        .iter()
        .map(|kv| Candidate::parse(kv.key_str(), kv.value_str()))
        .collect();
    Ok(ScanResult {
        prefix: prefix.to_string(),
        count: keys.len(),
        keys,
    })
}

// === resolve ===

#[derive(Serialize)]
pub struct ResolvedLeaf {
    pub field: String,
    pub key: String,
    pub value: String,
    pub depth: usize,
    /// Number of depths that had a key for this leaf.
    pub candidates: usize,
}

#[derive(Serialize)]
pub struct ResolveResult {
    pub prefix: String,
    pub fields: Vec<ResolvedLeaf>,
}

impl Output for ResolveResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.fields.is_empty() {
            return format!("No keys under {}", self.prefix);
        }
        let mut lines = vec![format!("Resolved under {}:", self.prefix)];
        for f in &self.fields {
            let shadowed = f.candidates.saturating_sub(1);
            let suffix = if shadowed > 0 {
                format!(" (overrides {})", shadowed)
            } else {
                String::new()
            };
            lines.push(format!("  {} = {:?} from {}{}", f.field, f.value, f.key, suffix));
        }
        lines.join("\n")
    }
}

/// Resolve the deepest key for every leaf name under `prefix`.
pub fn resolve(store: &dyn KvStore, prefix: &str, timeout: Duration) -> Result<ResolveResult> {
    let scanned = store.scan_prefix(prefix, deadline(timeout))?;
    let leaves = resolve_winners(
        scanned
            .iter()
            .map(|kv| (kv.key_str().into_owned(), kv.value_str().into_owned())),
    );

    let fields = leaves
        .into_iter()
        .filter_map(|(field, slots)| {
            let winner = slots.winner()?.clone();
            Some(ResolvedLeaf {
                field,
                key: winner.key,
                value: winner.value,
                depth: winner.depth,
                candidates: slots.len(),
            })
        })
        .collect();

    Ok(ResolveResult {
        prefix: prefix.to_string(),
        fields,
    })
}

// === put / delete ===

#[derive(Serialize)]
pub struct PutResult {
    pub key: String,
    pub value: String,
}

impl Output for PutResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Set {} = {:?}", self.key, self.value)
    }
}

pub fn put(store: &dyn KvStore, key: &str, value: &str, timeout: Duration) -> Result<PutResult> {
    if key.is_empty() {
        return Err(Error::InvalidInput("key must not be empty".to_string()));
    }
    store.put(key, value, deadline(timeout))?;
    tracing::info!(key = %key, "put key");
    Ok(PutResult {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Serialize)]
pub struct DeleteResult {
    pub key: String,
    pub deleted: u64,
}

impl Output for DeleteResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.deleted == 0 {
            format!("No key {}", self.key)
        } else {
            format!("Deleted {}", self.key)
        }
    }
}

pub fn delete(store: &dyn KvStore, key: &str, timeout: Duration) -> Result<DeleteResult> {
    if key.is_empty() {
        return Err(Error::InvalidInput("key must not be empty".to_string()));
    }
    let deleted = store.delete(key, deadline(timeout))?;
    Ok(DeleteResult {
        key: key.to_string(),
        deleted,
    })
}

// === prune ===

#[derive(Serialize)]
pub struct PruneResult {
    pub prefix: String,
    pub kept: Vec<String>,
    pub dry_run: bool,
    pub pruned: Vec<String>,
}

impl Output for PruneResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.pruned.is_empty() {
            return format!("Nothing to prune under {}", self.prefix);
        }
        let verb = if self.dry_run { "Would delete" } else { "Deleted" };
        let mut lines = vec![format!("{} {} key(s):", verb, self.pruned.len())];
        lines.extend(self.pruned.iter().map(|k| format!("  {}", k)));
        lines.join("\n")
    }
}

/// Delete keys under `prefix` whose leaf is not in `keep`.
pub fn prune(
    store: &dyn KvStore,
    prefix: &str,
    keep: Vec<String>,
    dry_run: bool,
    timeout: Duration,
) -> Result<PruneResult> {
    let pruned = prune_unused(store, prefix, keep.as_slice(), timeout, dry_run)?;
    Ok(PruneResult {
        prefix: prefix.to_string(),
        kept: keep,
        dry_run,
        pruned,
    })
}
