//! End-to-end tests for `Configurer` against in-memory and file stores.

use etcd_configer::coerce::{FieldKind, TypedValue};
use etcd_configer::config::BootstrapConfig;
use etcd_configer::schema::{ConfigType, Configurable, Field, Schema};
use etcd_configer::storage::{FileStore, KvStore, MemoryStore};
use etcd_configer::{Configurer, Error, FieldOutcome, Result, shared};
use std::time::Duration;
use tempfile::TempDir;

/// A type the coercion engine has no rule for.
#[derive(Debug, Default, Clone, PartialEq)]
struct Endpoint(String);

impl ConfigType for Endpoint {
    fn kind() -> FieldKind {
        FieldKind::Unsupported("Endpoint")
    }

    fn from_typed(_: TypedValue) -> Result<Self> {
        Err(Error::UnsupportedType("Endpoint".to_string()))
    }

    fn to_raw(&self) -> String {
        self.0.clone()
    }
}

#[derive(Debug, Default)]
struct AppConfig {
    timeout: i64,
    name: String,
    hosts: Vec<String>,
    debug: bool,
    ratio: f64,
    ttl: Duration,
    port: u16,
    endpoint: Endpoint,
}

impl Configurable for AppConfig {
    fn schema() -> Schema<Self> {
        Schema::new()
            .field(Field::new("Timeout", |c: &mut AppConfig| &mut c.timeout).default("10s"))
            .field(Field::new("Name", |c: &mut AppConfig| &mut c.name))
            .field(Field::new("Hosts", |c: &mut AppConfig| &mut c.hosts).default("a\nb"))
            .field(Field::new("Debug", |c: &mut AppConfig| &mut c.debug).tag("true"))
            .field(Field::new("Ratio", |c: &mut AppConfig| &mut c.ratio).tag(r#"default:"0.25" doc:"share""#))
            .field(Field::new("Ttl", |c: &mut AppConfig| &mut c.ttl).default("1m30s"))
            .field(Field::new("Port", |c: &mut AppConfig| &mut c.port).default("8080"))
            .field(Field::new("Endpoint", |c: &mut AppConfig| &mut c.endpoint))
            .field(Field::unexported::<String>("secret"))
    }
}

fn configurer(store: &MemoryStore, delete_unused: bool) -> Configurer {
    let bootstrap = BootstrapConfig::default()
        .with_root_path("/app")
        .with_delete_unused(delete_unused);
    Configurer::new(bootstrap, store.clone())
}

// === Default Seeding Tests ===

#[test]
fn test_empty_store_end_to_end() {
    let store = MemoryStore::new();
    let record = shared(AppConfig::default());
    let report = configurer(&store, false)
        .configure("app", &record, None)
        .unwrap();

    assert_eq!(store.get("/app/Timeout").as_deref(), Some("10s"));
    assert_eq!(store.get("/app/Name").as_deref(), Some(""));
    assert_eq!(store.get("/app/Hosts").as_deref(), Some("a\nb"));
    assert_eq!(store.get("/app/Debug").as_deref(), Some("true"));
    assert_eq!(store.get("/app/Ratio").as_deref(), Some("0.25"));
    assert_eq!(store.get("/app/secret"), None);

    let app = record.read().unwrap();
    assert_eq!(app.timeout, 10_000_000_000);
    assert_eq!(app.name, "");
    assert_eq!(app.hosts, vec!["a", "b"]);
    assert!(app.debug);
    assert_eq!(app.ratio, 0.25);
    assert_eq!(app.ttl, Duration::from_secs(90));
    assert_eq!(app.port, 8080);

    assert_eq!(report.fields.len(), 8);
    assert_eq!(report.rejected(), vec!["Endpoint"]);
    match report.outcome("Endpoint") {
        Some(FieldOutcome::Rejected { reason }) => {
            assert_eq!(reason, "unsupported config type: Endpoint")
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_seeded_defaults_round_trip() {
    let store = MemoryStore::new();
    let configurer = configurer(&store, false);
    let first = shared(AppConfig::default());
    configurer.configure("app", &first, None).unwrap();

    let second = shared(AppConfig::default());
    let report = configurer.configure("app", &second, None).unwrap();

    assert!(report.defaulted().is_empty());
    let (a, b) = (first.read().unwrap(), second.read().unwrap());
    assert_eq!(a.timeout, b.timeout);
    assert_eq!(a.hosts, b.hosts);
    assert_eq!(a.ttl, b.ttl);
}

// === Precedence Tests ===

#[test]
fn test_deepest_key_wins_regardless_of_order() {
    let store = MemoryStore::with_entries([
        ("/app/Name", "root"),
        ("/app/a/b/c/Name", "deep"),
        ("/app/a/Name", "mid"),
    ]);
    let record = shared(AppConfig::default());
    let report = configurer(&store, false)
        .configure("app", &record, None)
        .unwrap();

    assert_eq!(record.read().unwrap().name, "deep");
    assert_eq!(
        report.outcome("Name"),
        Some(&FieldOutcome::Stored {
            key: "/app/a/b/c/Name".to_string(),
            depth: 5,
        })
    );
}

// === Coercion Tests ===

#[test]
fn test_integer_accepts_duration_or_plain() {
    let store = MemoryStore::with_entries([("/app/Timeout", "5s"), ("/app/Port", "5")]);
    let record = shared(AppConfig::default());
    configurer(&store, false)
        .configure("app", &record, None)
        .unwrap();

    let app = record.read().unwrap();
    assert_eq!(app.timeout, 5_000_000_000);
    assert_eq!(app.port, 5);
}

#[test]
fn test_bad_values_leave_fields_and_continue() {
    let store = MemoryStore::with_entries([
        ("/app/Timeout", "notanumber"),
        ("/app/Debug", "yes"),
        ("/app/Port", "70000"),
        ("/app/Name", "still-applied"),
    ]);
    let record = shared(AppConfig::default());
    let report = configurer(&store, false)
        .configure("app", &record, None)
        .unwrap();

    let app = record.read().unwrap();
    assert_eq!(app.timeout, 0);
    assert!(!app.debug);
    assert_eq!(app.port, 0);
    assert_eq!(app.name, "still-applied");
    assert_eq!(report.rejected(), vec!["Timeout", "Debug", "Port", "Endpoint"]);
}

#[test]
fn test_empty_list_value_is_one_empty_entry() {
    let store = MemoryStore::with_entries([("/app/Hosts", "")]);
    let record = shared(AppConfig::default());
    configurer(&store, false)
        .configure("app", &record, None)
        .unwrap();
    assert_eq!(record.read().unwrap().hosts, vec![""]);
}

// === Unknown Key / Prune Tests ===

#[test]
fn test_unknown_key_tolerated() {
    let store = MemoryStore::with_entries([("/app/doesNotExist", "1")]);
    let record = shared(AppConfig::default());
    let report = configurer(&store, false)
        .configure("app", &record, None)
        .unwrap();

    assert_eq!(report.unknown_keys, vec!["/app/doesNotExist"]);
    assert_eq!(store.get("/app/doesNotExist").as_deref(), Some("1"));
}

#[test]
fn test_prune_enabled_deletes_only_unknown() {
    let store = MemoryStore::with_entries([("/app/Name", "a"), ("/app/Timeout", "1s"), ("/app/Z", "z")]);
    let record = shared(AppConfig::default());
    let report = configurer(&store, true)
        .configure("app", &record, None)
        .unwrap();

    assert_eq!(report.pruned, vec!["/app/Z"]);
    assert_eq!(store.get("/app/Z"), None);
    assert_eq!(store.get("/app/Name").as_deref(), Some("a"));
    assert_eq!(store.get("/app/Timeout").as_deref(), Some("1s"));
}

// === Store Tests ===

#[test]
fn test_file_store_backend() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path().join("config.json"));
    store
        .put("/svc/eu/Port", "9090", std::time::Instant::now() + Duration::from_secs(5))
        .unwrap();

    let configurer = Configurer::new(BootstrapConfig::default().with_root_path("/svc"), store.clone());
    let record = shared(AppConfig::default());
    configurer.configure("svc", &record, None).unwrap();

    assert_eq!(record.read().unwrap().port, 9090);
    let text = std::fs::read_to_string(store.path()).unwrap();
    assert!(text.contains("\"/svc/Timeout\": \"10s\""));
}

#[test]
fn test_store_timeout_is_returned() {
    let store = MemoryStore::new();
    let bootstrap = BootstrapConfig::default().with_session_timeout(Duration::ZERO);
    let configurer = Configurer::new(bootstrap, store.clone());
    let record = shared(AppConfig::default());

    let err = configurer.configure("app", &record, None).unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));
    assert!(store.snapshot().is_empty());
}
