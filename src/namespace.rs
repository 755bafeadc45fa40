//! Namespaces: a named group of fields bound to one store path.
//!
//! Building a [`Namespace`] turns a [`Schema`] into field descriptors once.
//! Each descriptor owns the only write handle to its field in the live
//! record and collects the candidate values seen for it, one per depth.

use crate::coerce::{FieldKind, coerce};
use crate::resolver::{Candidate, CandidateSlots, SEPARATOR};
use crate::schema::{Binding, Schema, Tag};
use crate::value::RawValue;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

/// A record shared between the application and its namespace.
pub type Shared<T> = Arc<RwLock<T>>;

/// Called with the field name and its previous value after a live update.
pub type UpdateCallback = Arc<dyn Fn(&str, &RawValue) + Send + Sync>;

/// Wrap a record for registration.
pub fn shared<T>(record: T) -> Shared<T> {
    Arc::new(RwLock::new(record))
}

/// One settable field of a registered record.
pub struct FieldDescriptor<T> {
    name: String,
    kind: FieldKind,
    tag: Tag,
    binding: Binding<T>,
    candidates: CandidateSlots,
    assignable: bool,
}

impl<T> FieldDescriptor<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn metadata(&self) -> &Tag {
        &self.tag
    }

    pub fn candidates(&self) -> &CandidateSlots {
        &self.candidates
    }

    pub fn is_assignable(&self) -> bool {
        self.assignable
    }

    /// Value seeded into the store when no key exists.
    ///
    /// An explicit `default:"..."` entry wins; otherwise the whole tag text
    /// is the default (empty when the field has no tag).
    pub fn default_value(&self) -> String {
        self.tag
            .lookup("default")
            .unwrap_or_else(|| self.tag.as_str().to_string())
    }

    pub(crate) fn observe(&mut self, candidate: Candidate) {
        self.candidates.observe(candidate);
    }

    pub(crate) fn clear_candidates(&mut self) {
        self.candidates.clear();
    }

    /// Coerce `raw` and write it into `record`, returning the previous value
    /// in text form. On error the field keeps its current value.
    pub(crate) fn assign(&self, record: &mut T, raw: &RawValue) -> Result<String> {
        let typed = coerce(raw, self.kind)?;
        let previous = self.binding.read(record);
        self.binding.write(record, typed)?;
        Ok(previous)
    }
}

impl<T> std::fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("tag", &self.tag)
            .field("candidates", &self.candidates.len())
            .finish()
    }
}

/// What a single incremental update did.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The key's leaf names no declared field.
    Unknown,
    /// A deeper candidate for the same field keeps precedence.
    Shadowed { field: String, by: String },
    /// The field was rewritten; `previous` is its old value.
    Applied { field: String, previous: RawValue },
    /// The value did not coerce; the field is unchanged.
    Rejected { field: String, reason: String },
    /// The namespace could not take the update at all.
    Failed { reason: String },
}

/// A configuration group registered under a unique name.
pub struct Namespace<T> {
    name: String,
    path: String,
    paths: Vec<String>,
    fields: Vec<FieldDescriptor<T>>,
    index: HashMap<String, usize>,
    record: Shared<T>,
    callback: Option<UpdateCallback>,
}

impl<T: Send + Sync + 'static> Namespace<T> {
    /// Extract field descriptors from `schema`, in declaration order.
    ///
    /// Fields without a write handle, with an empty name or a name
    /// containing the separator, or repeating an earlier name are logged
    /// and left out; they never become resolution targets.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        schema: Schema<T>,
        record: Shared<T>,
        callback: Option<UpdateCallback>,
    ) -> Self {
        let name = name.into();
        let path = path.into();
        let mut fields = Vec::with_capacity(schema.len());
        let mut index = HashMap::new();

        for field in schema.into_fields() {
            let Some(binding) = field.binding else {
                tracing::warn!(
                    namespace = %name,
                    field = %field.name,
                    "cannot assign store values to unexported field; skipping"
                );
                continue;
            };
            if field.name.is_empty() || field.name.contains(SEPARATOR) {
                tracing::warn!(namespace = %name, field = %field.name, "invalid field name; skipping");
                continue;
            }
            if index.contains_key(&field.name) {
                tracing::warn!(namespace = %name, field = %field.name, "duplicate field; skipping");
                continue;
            }

            index.insert(field.name.clone(), fields.len());
            fields.push(FieldDescriptor {
                name: field.name,
                kind: field.kind,
                tag: field.tag,
                binding,
                candidates: CandidateSlots::new(),
                assignable: true,
            });
        }

        Self {
            name,
            paths: vec![path.clone()],
            path,
            fields,
            index,
            record,
            callback,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The store path defaults are written under.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Store paths this namespace reads from.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.index.get(name).map(|i| &self.fields[*i])
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn declares(&self, field: &str) -> bool {
        self.index.contains_key(field)
    }

    pub fn record(&self) -> &Shared<T> {
        &self.record
    }

    pub(crate) fn fields_mut(&mut self) -> &mut [FieldDescriptor<T>] {
        &mut self.fields
    }

    /// Route a scanned candidate to its field. Returns `false` for unknown leaves.
    pub(crate) fn observe(&mut self, candidate: Candidate) -> bool {
        match self.index.get(&candidate.field) {
            Some(i) => {
                self.fields[*i].observe(candidate);
                true
            }
            None => false,
        }
    }

    pub(crate) fn write_record(&self) -> Result<RwLockWriteGuard<'_, T>> {
        self.record
            .write()
            .map_err(|_| Error::Poisoned(format!("record of namespace {}", self.name)))
    }

    pub(crate) fn callback(&self) -> Option<UpdateCallback> {
        self.callback.clone()
    }

    /// Apply one changed key without rescanning the store.
    ///
    /// The candidate joins its field's slots; it is applied only if no
    /// deeper candidate exists. The callback runs after the record lock is
    /// released.
    pub fn apply_update(&mut self, candidate: Candidate) -> Result<UpdateOutcome> {
        let outcome = self.update(candidate)?;
        if let (UpdateOutcome::Applied { field, previous }, Some(callback)) = (&outcome, &self.callback) {
            callback(field, previous);
        }
        Ok(outcome)
    }

    /// [`Namespace::apply_update`] without the callback.
    pub(crate) fn update(&mut self, candidate: Candidate) -> Result<UpdateOutcome> {
        let Some(&i) = self.index.get(&candidate.field) else {
            tracing::info!(namespace = %self.name, key = %candidate.key, "unknown parameter");
            return Ok(UpdateOutcome::Unknown);
        };

        let field_name = self.fields[i].name.clone();
        let key = candidate.key.clone();
        let value = RawValue::new(candidate.value.clone());
        self.fields[i].observe(candidate);

        if let Some(winner) = self.fields[i].candidates().winner() {
            if winner.key != key {
                tracing::debug!(namespace = %self.name, key = %key, by = %winner.key, "update shadowed by deeper key");
                return Ok(UpdateOutcome::Shadowed {
                    field: field_name,
                    by: winner.key.clone(),
                });
            }
        }

        let outcome = {
            let mut record = self.write_record()?;
            match self.fields[i].assign(&mut record, &value) {
                Ok(previous) => UpdateOutcome::Applied {
                    field: field_name.clone(),
                    previous: RawValue::new(previous),
                },
                Err(e) => {
                    tracing::warn!(
                        namespace = %self.name,
                        field = %field_name,
                        value = %value,
                        error = %e,
                        "failed to apply value"
                    );
                    UpdateOutcome::Rejected {
                        field: field_name.clone(),
                        reason: e.to_string(),
                    }
                }
            }
        };
        Ok(outcome)
    }
}
