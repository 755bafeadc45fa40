//! Hierarchical key resolution.
//!
//! Store keys look like `segment/segment/.../Leaf`. The leaf names the field
//! and the number of `/` separators is the key's depth. When several keys
//! name the same field, the deepest one wins: a key under a more specific
//! subgroup overrides one nearer the root.
//!
//! ```text
//! /app/Timeout            depth 2
//! /app/eu/Timeout         depth 3
//! /app/eu/fra-1/Timeout   depth 4   <- applied
//! ```

use serde::Serialize;
use std::collections::BTreeMap;

/// Hierarchy separator in store keys.
pub const SEPARATOR: char = '/';

/// Split a key into its depth and leaf segment.
///
/// No validation is done: a key without separators has depth 0 and is its
/// own leaf, and a key ending in `/` has an empty leaf.
pub fn split_key(key: &str) -> (usize, &str) {
    let depth = key.matches(SEPARATOR).count();
    let leaf = key.rsplit(SEPARATOR).next().unwrap_or(key);
    (depth, leaf)
}

/// Join a namespace path and a field name with exactly one separator.
pub fn join_key(path: &str, field: &str) -> String {
    format!("{}{}{}", path.trim_end_matches(SEPARATOR), SEPARATOR, field)
}

/// One raw key/value observation competing to set a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub depth: usize,
    pub key: String,
    pub value: String,
    /// Leaf segment of `key`.
    pub field: String,
}

impl Candidate {
    pub fn parse(key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let (depth, leaf) = split_key(&key);
        let field = leaf.to_string();
        Self {
            depth,
            key,
            value: value.into(),
            field,
        }
    }
}

/// The latest candidate seen at each depth for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSlots {
    by_depth: BTreeMap<usize, Candidate>,
}

impl CandidateSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a candidate, replacing any earlier one at the same depth.
    pub fn observe(&mut self, candidate: Candidate) {
        self.by_depth.insert(candidate.depth, candidate);
    }

    /// The deepest candidate, if any.
    pub fn winner(&self) -> Option<&Candidate> {
        self.by_depth.last_key_value().map(|(_, c)| c)
    }

    pub fn len(&self) -> usize {
        self.by_depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_depth.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_depth.clear();
    }

    /// All candidates, shallowest first.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.by_depth.values()
    }
}

/// Group scanned pairs by leaf name and keep each leaf's slots.
///
/// Used where no declared field set exists (e.g. inspecting a store path);
/// every leaf becomes a resolution target.
pub fn resolve_winners<I, K, V>(pairs: I) -> BTreeMap<String, CandidateSlots>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut leaves: BTreeMap<String, CandidateSlots> = BTreeMap::new();
    for (key, value) in pairs {
        let candidate = Candidate::parse(key, value);
        leaves
            .entry(candidate.field.clone())
            .or_default()
            .observe(candidate);
    }
    leaves
}
