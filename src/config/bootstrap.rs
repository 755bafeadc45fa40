//! Process bootstrap settings.

use super::resolver::{BootstrapOverrides, env_lookup, resolve_bootstrap};
use std::time::Duration;

/// Default etcd endpoint.
pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:2379";
/// Default root path.
pub const DEFAULT_ROOT_PATH: &str = "/";
/// Default bound on each store operation.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings needed before any namespace can be configured.
///
/// Passed explicitly into [`Configurer::new`](crate::Configurer::new); the
/// library never reads the environment behind the caller's back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// etcd endpoints, tried in order
    pub endpoints: Vec<String>,
    /// Store path that namespaces read from unless given their own
    pub root_path: String,
    /// Prune keys no declared field references after each pass
    pub delete_unused: bool,
    /// Bound on each scan, put and delete
    pub session_timeout: Duration,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![DEFAULT_ENDPOINT.to_string()],
            root_path: DEFAULT_ROOT_PATH.to_string(),
            delete_unused: false,
            session_timeout: DEFAULT_SESSION_TIMEOUT,
        }
    }
}

impl BootstrapConfig {
    /// Resolve from the process environment, logging ignored variables.
    pub fn from_env() -> Self {
        let resolved = resolve_bootstrap(env_lookup, &BootstrapOverrides::default());
        for warning in &resolved.warnings {
            tracing::warn!("{}", warning);
        }
        resolved.to_config()
    }

    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_root_path(mut self, root_path: impl Into<String>) -> Self {
        self.root_path = root_path.into();
        self
    }

    pub fn with_delete_unused(mut self, delete_unused: bool) -> Self {
        self.delete_unused = delete_unused;
        self
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BootstrapConfig::default();
        assert_eq!(config.endpoints, vec!["127.0.0.1:2379"]);
        assert_eq!(config.root_path, "/");
        assert!(!config.delete_unused);
        assert_eq!(config.session_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_builders() {
        let config = BootstrapConfig::default()
            .with_root_path("/svc")
            .with_delete_unused(true)
            .with_session_timeout(Duration::from_secs(1));
        assert_eq!(config.root_path, "/svc");
        assert!(config.delete_unused);
        assert_eq!(config.session_timeout, Duration::from_secs(1));
    }
}
