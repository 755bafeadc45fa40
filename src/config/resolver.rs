//! Precedence resolution for the bootstrap settings.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`ETCD_ADDRESS`, `ETCD_PATH`,
//!    `ETCD_DELETE_UNUSED`, `ETCD_SESSION_TIMEOUT`)
//! 3. Built-in defaults
//!
//! A variable that is set but does not parse is ignored with a warning and
//! the default applies.

use crate::config::BootstrapConfig;
use crate::value::{RawValue, format_duration};
use serde::Serialize;
use std::time::Duration;

/// Comma-separated list of etcd endpoints.
pub const ADDRESS_ENV: &str = "ETCD_ADDRESS";
/// Root path that namespaces read from.
pub const PATH_ENV: &str = "ETCD_PATH";
/// Boolean toggle for pruning undeclared keys.
pub const DELETE_UNUSED_ENV: &str = "ETCD_DELETE_UNUSED";
/// Duration bounding each store operation.
pub const SESSION_TIMEOUT_ENV: &str = "ETCD_SESSION_TIMEOUT";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

impl Serialize for ValueSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, Serialize)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved bootstrap settings with source tracking.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedBootstrap {
    pub endpoints: Resolved<Vec<String>>,
    pub root_path: Resolved<String>,
    pub delete_unused: Resolved<bool>,
    #[serde(serialize_with = "serialize_resolved_duration")]
    pub session_timeout: Resolved<Duration>,
    /// Variables that were set but ignored
    pub warnings: Vec<String>,
}

fn serialize_resolved_duration<S: serde::Serializer>(
    resolved: &Resolved<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    Resolved::new(format_duration(resolved.value), resolved.source.clone()).serialize(serializer)
}

impl ResolvedBootstrap {
    /// Drop the source tracking.
    pub fn to_config(&self) -> BootstrapConfig {
        BootstrapConfig {
            endpoints: self.endpoints.value.clone(),
            root_path: self.root_path.value.clone(),
            delete_unused: self.delete_unused.value,
            session_timeout: self.session_timeout.value,
        }
    }
}

/// CLI overrides for bootstrap resolution.
#[derive(Debug, Clone, Default)]
pub struct BootstrapOverrides {
    pub endpoints: Option<Vec<String>>,
    pub root_path: Option<String>,
    pub delete_unused: Option<bool>,
    pub session_timeout: Option<Duration>,
}

impl BootstrapOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    pub fn with_root_path(mut self, root_path: impl Into<String>) -> Self {
        self.root_path = Some(root_path.into());
        self
    }

    pub fn with_delete_unused(mut self, delete_unused: bool) -> Self {
        self.delete_unused = Some(delete_unused);
        self
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = Some(timeout);
        self
    }
}

/// Split a comma-separated endpoint list, dropping blank entries.
pub fn split_endpoints(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a variable from the process environment.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Resolve the bootstrap settings.
///
/// `lookup` reads one environment variable; pass [`env_lookup`] for the
/// process environment or a closure over a map in tests.
pub fn resolve_bootstrap<F>(lookup: F, overrides: &BootstrapOverrides) -> ResolvedBootstrap
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = BootstrapConfig::default();
    let mut warnings = Vec::new();
    let from_env = |name: &str| ValueSource::EnvVar(name.to_string());

    let endpoints = if let Some(ref endpoints) = overrides.endpoints {
        Resolved::new(endpoints.clone(), ValueSource::CliFlag)
    } else {
        match lookup(ADDRESS_ENV).map(|raw| split_endpoints(&raw)) {
            Some(list) if !list.is_empty() => Resolved::new(list, from_env(ADDRESS_ENV)),
            Some(_) => {
                warnings.push(format!("{} is set but lists no endpoints", ADDRESS_ENV));
                Resolved::new(defaults.endpoints.clone(), ValueSource::Default)
            }
            None => Resolved::new(defaults.endpoints.clone(), ValueSource::Default),
        }
    };

    let root_path = if let Some(ref path) = overrides.root_path {
        Resolved::new(path.clone(), ValueSource::CliFlag)
    } else if let Some(path) = lookup(PATH_ENV) {
        Resolved::new(path, from_env(PATH_ENV))
    } else {
        Resolved::new(defaults.root_path.clone(), ValueSource::Default)
    };

    let delete_unused = if let Some(flag) = overrides.delete_unused {
        Resolved::new(flag, ValueSource::CliFlag)
    } else {
        match lookup(DELETE_UNUSED_ENV) {
            Some(raw) => match RawValue::new(raw).as_bool() {
                Ok(flag) => Resolved::new(flag, from_env(DELETE_UNUSED_ENV)),
                Err(e) => {
                    warnings.push(format!("ignoring {}: {}", DELETE_UNUSED_ENV, e));
                    Resolved::new(defaults.delete_unused, ValueSource::Default)
                }
            },
            None => Resolved::new(defaults.delete_unused, ValueSource::Default),
        }
    };

    let session_timeout = if let Some(timeout) = overrides.session_timeout {
        Resolved::new(timeout, ValueSource::CliFlag)
    } else {
        match lookup(SESSION_TIMEOUT_ENV) {
            Some(raw) => match RawValue::new(raw).as_duration() {
                Ok(timeout) => Resolved::new(timeout, from_env(SESSION_TIMEOUT_ENV)),
                Err(e) => {
                    warnings.push(format!("ignoring {}: {}", SESSION_TIMEOUT_ENV, e));
                    Resolved::new(defaults.session_timeout, ValueSource::Default)
                }
            },
            None => Resolved::new(defaults.session_timeout, ValueSource::Default),
        }
    };

    ResolvedBootstrap {
        endpoints,
        root_path,
        delete_unused,
        session_timeout,
        warnings,
    }
}
