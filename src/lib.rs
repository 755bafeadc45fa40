//! etcd-configer - keep typed configuration records in sync with a
//! hierarchical key-value store.
//!
//! A record declares its fields once through a [`schema::Schema`]. Each
//! [`Configurer::configure`] call scans the store under the namespace path,
//! applies the deepest key found for every field, seeds missing keys with
//! their declared defaults and optionally deletes keys no field declares.
//!
//! ```no_run
//! use etcd_configer::config::BootstrapConfig;
//! use etcd_configer::schema::{Configurable, Field, Schema};
//! use etcd_configer::{Configurer, shared};
//!
//! #[derive(Default)]
//! struct Http {
//!     timeout: i64,
//!     name: String,
//! }
//!
//! impl Configurable for Http {
//!     fn schema() -> Schema<Self> {
//!         Schema::new()
//!             .field(Field::new("Timeout", |c: &mut Http| &mut c.timeout).default("10s"))
//!             .field(Field::new("Name", |c: &mut Http| &mut c.name))
//!     }
//! }
//!
//! let configurer = Configurer::connect(BootstrapConfig::from_env())?;
//! let http = shared(Http::default());
//! configurer.configure_or_exit("http", &http, None);
//! # Ok::<(), etcd_configer::Error>(())
//! ```

pub mod cli;
pub mod coerce;
pub mod commands;
pub mod config;
pub mod configurer;
pub mod namespace;
pub mod resolver;
pub mod schema;
pub mod storage;
pub mod sync;
pub mod value;

pub use configurer::Configurer;
pub use namespace::{Shared, UpdateCallback, shared};
pub use sync::{FieldOutcome, SyncReport};
pub use value::RawValue;

/// Version string shown by `ecfg --version`.
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("ECFG_GIT_COMMIT"),
    " ",
    env!("ECFG_BUILD_TIMESTAMP"),
    ")"
);


/// Library-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Timed out during {0}")]
    Timeout(String),

    #[error("cannot parse {value:?} as {expected}: {reason}")]
    Coercion {
        value: String,
        expected: &'static str,
        reason: String,
    },

    #[error("unsupported config type: {0}")]
    UnsupportedType(String),

    #[error("value {value} out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Lock poisoned: {0}")]
    Poisoned(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;
