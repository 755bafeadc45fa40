//! One full resolution pass for a namespace.
//!
//! scan the namespace path -> route candidates to fields -> per field either
//! apply the deepest candidate or seed the declared default -> optionally
//! delete keys no field declares.

use crate::namespace::Namespace;
use crate::resolver::{Candidate, join_key, split_key};
use crate::storage::KvStore;
use crate::value::RawValue;
use crate::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Knobs for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Bound on each individual store operation.
    pub timeout: Duration,
    /// Delete keys under the path whose leaf names no declared field.
    pub delete_unused: bool,
}

impl SyncSettings {
    fn deadline(&self) -> Instant {
        Instant::now() + self.timeout
    }
}

/// How one field got its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FieldOutcome {
    /// Applied from an existing key.
    Stored { key: String, depth: usize },
    /// No key existed; the default was written to `key` and applied.
    Defaulted { key: String },
    /// The value did not coerce; the field kept its previous value.
    Rejected { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldReport {
    pub field: String,
    #[serde(flatten)]
    pub outcome: FieldOutcome,
}

/// What a pass did, field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub namespace: String,
    pub path: String,
    pub fields: Vec<FieldReport>,
    /// Scanned keys whose leaf matched no field.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unknown_keys: Vec<String>,
    /// Keys deleted by the prune pass.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pruned: Vec<String>,
}

impl SyncReport {
    pub fn outcome(&self, field: &str) -> Option<&FieldOutcome> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| &f.outcome)
    }

    /// Names of fields that fell back to their default.
    pub fn defaulted(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| matches!(f.outcome, FieldOutcome::Defaulted { .. }))
            .map(|f| f.field.as_str())
            .collect()
    }

    pub fn rejected(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| matches!(f.outcome, FieldOutcome::Rejected { .. }))
            .map(|f| f.field.as_str())
            .collect()
    }
}

/// Run one pass for `namespace` against `store`.
///
/// Store errors abort the pass and are returned; the record is only
/// touched once every default has been written. Coercion errors are
/// logged, recorded as [`FieldOutcome::Rejected`] and the pass continues.
pub fn synchronize<T: Send + Sync + 'static>(
    namespace: &mut Namespace<T>,
    store: &dyn KvStore,
    settings: &SyncSettings,
) -> Result<SyncReport> {
    let path = namespace.path().to_string();
    let mut report = SyncReport {
        namespace: namespace.name().to_string(),
        path: path.clone(),
        ..Default::default()
    };

    let scanned = store.scan_prefix(&path, settings.deadline())?;

    for field in namespace.fields_mut() {
        field.clear_candidates();
    }
    for kv in &scanned {
        let candidate = Candidate::parse(kv.key_str(), kv.value_str());
        tracing::info!(namespace = %report.namespace, key = %candidate.key, value = %candidate.value, "received parameter");
        let key = candidate.key.clone();
        if !namespace.observe(candidate) {
            tracing::info!(namespace = %report.namespace, key = %key, "unknown parameter");
            report.unknown_keys.push(key);
        }
    }

    // Store writes happen before the record lock is taken.
    let mut resolved = Vec::with_capacity(namespace.fields().len());
    for field in namespace.fields() {
        if !field.is_assignable() {
            continue;
        }
        let pending = match field.candidates().winner() {
            Some(winner) => (
                RawValue::new(winner.value.clone()),
                FieldOutcome::Stored {
                    key: winner.key.clone(),
                    depth: winner.depth,
                },
            ),
            None => {
                let key = join_key(&path, field.name());
                let default = field.default_value();
                store.put(&key, &default, settings.deadline())?;
                tracing::info!(namespace = %report.namespace, key = %key, value = %default, "seeded default");
                (RawValue::new(default), FieldOutcome::Defaulted { key })
            }
        };
        resolved.push(pending);
    }

    {
        let mut record = namespace.write_record()?;
        let assignable = namespace.fields().iter().filter(|f| f.is_assignable());
        for (field, (raw, applied)) in assignable.zip(resolved) {
            let outcome = match field.assign(&mut record, &raw) {
                Ok(_) => applied,
                Err(e) => {
                    tracing::warn!(
                        namespace = %report.namespace,
                        field = %field.name(),
                        value = %raw,
                        error = %e,
                        "failed to apply value"
                    );
                    FieldOutcome::Rejected {
                        reason: e.to_string(),
                    }
                }
            };
            report.fields.push(FieldReport {
                field: field.name().to_string(),
                outcome,
            });
        }
    }

    if settings.delete_unused {
        let declared = namespace.field_names();
        report.pruned = prune_unused(store, &path, declared.as_slice(), settings.timeout, false)?;
    }

    Ok(report)
}

/// Delete every key under `prefix` whose leaf is not in `declared`.
///
/// The prefix is rescanned first. With `dry_run` nothing is deleted; the
/// keys that would go are still returned.
pub fn prune_unused<S: AsRef<str>>(
    store: &dyn KvStore,
    prefix: &str,
    declared: &[S],
    timeout: Duration,
    dry_run: bool,
) -> Result<Vec<String>> {
    let declared: HashSet<&str> = declared.iter().map(AsRef::<str>::as_ref).collect();
    let scanned = store.scan_prefix(prefix, Instant::now() + timeout)?;

    let mut pruned = Vec::new();
    for kv in scanned {
        let key = kv.key_str().into_owned();
        let (_, leaf) = split_key(&key);
        if declared.contains(leaf) {
            continue;
        }
        if !dry_run {
            store.delete(&key, Instant::now() + timeout)?;
            tracing::info!(key = %key, "deleted unused key");
        }
        pruned.push(key);
    }
    Ok(pruned)
}
