//! Bootstrap configuration for the synchronizer itself.
//!
//! These are the few settings needed before any namespace can be read:
//!
//! - `ETCD_ADDRESS` - comma-separated endpoints (default `127.0.0.1:2379`)
//! - `ETCD_PATH` - root path namespaces read from (default `/`)
//! - `ETCD_DELETE_UNUSED` - prune undeclared keys after a pass (default `false`)
//! - `ETCD_SESSION_TIMEOUT` - bound on each store operation (default `5s`)
//!
//! ## Precedence
//!
//! CLI flag > environment variable > built-in default
//!
//! Use the [`resolver`] module for precedence resolution with source tracking.

pub mod bootstrap;
pub mod resolver;

pub use bootstrap::{BootstrapConfig, DEFAULT_ENDPOINT, DEFAULT_ROOT_PATH, DEFAULT_SESSION_TIMEOUT};
pub use resolver::{
    ADDRESS_ENV, BootstrapOverrides, DELETE_UNUSED_ENV, PATH_ENV, Resolved, ResolvedBootstrap,
    SESSION_TIMEOUT_ENV, ValueSource, env_lookup, resolve_bootstrap, split_endpoints,
};
