//! The configuration facade and namespace registry.

use crate::config::BootstrapConfig;
use crate::namespace::{Namespace, Shared, UpdateCallback, UpdateOutcome};
use crate::resolver::Candidate;
use crate::schema::{Configurable, Schema};
use crate::storage::{EtcdStore, KvStore};
use crate::sync::{SyncReport, SyncSettings, synchronize};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// A registered namespace with its record type erased.
trait Registration: Send + Sync {
    fn paths(&self) -> &[String];
    fn apply(&mut self, candidate: Candidate) -> Result<UpdateOutcome>;
    fn callback(&self) -> Option<UpdateCallback>;
}

impl<T: Send + Sync + 'static> Registration for Namespace<T> {
    fn paths(&self) -> &[String] {
        Namespace::paths(self)
    }

    fn apply(&mut self, candidate: Candidate) -> Result<UpdateOutcome> {
        self.update(candidate)
    }

    fn callback(&self) -> Option<UpdateCallback> {
        Namespace::callback(self)
    }
}

#[derive(Default)]
struct Registry {
    namespaces: HashMap<String, Box<dyn Registration>>,
    /// store path -> names of namespaces reading it
    subscribers: BTreeMap<String, Vec<String>>,
}

impl Registry {
    fn insert(&mut self, name: String, registration: Box<dyn Registration>) {
        self.remove(&name);
        for path in registration.paths() {
            let names = self.subscribers.entry(path.clone()).or_default();
            if !names.contains(&name) {
                names.push(name.clone());
            }
        }
        self.namespaces.insert(name, registration);
    }

    fn remove(&mut self, name: &str) {
        if self.namespaces.remove(name).is_none() {
            return;
        }
        self.subscribers.retain(|_, names| {
            names.retain(|n| n != name);
            !names.is_empty()
        });
    }
}

/// Binds records to the store.
///
/// Each `configure*` call registers (or replaces) a namespace and runs one
/// full resolution pass for it before returning.
pub struct Configurer {
    bootstrap: BootstrapConfig,
    store: Arc<dyn KvStore>,
    registry: Mutex<Registry>,
}

impl Configurer {
    pub fn new(bootstrap: BootstrapConfig, store: impl KvStore + 'static) -> Self {
        Self {
            bootstrap,
            store: Arc::new(store),
            registry: Mutex::new(Registry::default()),
        }
    }

    /// Build a configurer backed by the etcd endpoints in `bootstrap`.
    pub fn connect(bootstrap: BootstrapConfig) -> Result<Self> {
        let store = EtcdStore::connect(&bootstrap.endpoints, bootstrap.session_timeout)?;
        Ok(Self::new(bootstrap, store))
    }

    pub fn bootstrap(&self) -> &BootstrapConfig {
        &self.bootstrap
    }

    pub fn store(&self) -> &dyn KvStore {
        self.store.as_ref()
    }

    fn settings(&self) -> SyncSettings {
        SyncSettings {
            timeout: self.bootstrap.session_timeout,
            delete_unused: self.bootstrap.delete_unused,
        }
    }

    fn registry(&self) -> Result<MutexGuard<'_, Registry>> {
        self.registry
            .lock()
            .map_err(|_| Error::Poisoned("namespace registry".to_string()))
    }

    /// Register `record` under `name` at the root path and synchronize it.
    pub fn configure<T: Configurable>(
        &self,
        name: &str,
        record: &Shared<T>,
        callback: Option<UpdateCallback>,
    ) -> Result<SyncReport> {
        self.configure_with_schema(name, T::schema(), record, callback)
    }

    pub fn configure_with_schema<T: Send + Sync + 'static>(
        &self,
        name: &str,
        schema: Schema<T>,
        record: &Shared<T>,
        callback: Option<UpdateCallback>,
    ) -> Result<SyncReport> {
        let path = self.bootstrap.root_path.clone();
        self.configure_with_path(name, &path, schema, record, callback)
    }

    /// Register `record` under `name`, reading keys below `path`.
    ///
    /// A namespace is only registered once its pass succeeds. A failed pass
    /// leaves any earlier registration of `name` in place.
    pub fn configure_with_path<T: Send + Sync + 'static>(
        &self,
        name: &str,
        path: &str,
        schema: Schema<T>,
        record: &Shared<T>,
        callback: Option<UpdateCallback>,
    ) -> Result<SyncReport> {
        let mut namespace = Namespace::new(name, path, schema, Arc::clone(record), callback);
        let report = synchronize(&mut namespace, self.store.as_ref(), &self.settings())?;
        tracing::debug!(
            namespace = %name,
            path = %path,
            fields = report.fields.len(),
            "namespace configured"
        );
        self.registry()?.insert(name.to_string(), Box::new(namespace));
        Ok(report)
    }

    /// Like [`Configurer::configure`], but a failed pass logs the error and
    /// terminates the process with exit status 1.
    pub fn configure_or_exit<T: Configurable>(
        &self,
        name: &str,
        record: &Shared<T>,
        callback: Option<UpdateCallback>,
    ) -> SyncReport {
        match self.configure(name, record, callback) {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(namespace = %name, error = %e, "configuration failed");
                std::process::exit(1);
            }
        }
    }

    /// Apply one changed key to every namespace whose path prefixes it.
    ///
    /// A namespace that cannot take the update reports
    /// [`UpdateOutcome::Failed`] without stopping the others. Callbacks run
    /// once the registry is unlocked, so they may call back into this
    /// configurer.
    pub fn apply_update(&self, key: &str, value: &str) -> Result<Vec<(String, UpdateOutcome)>> {
        let mut applied = Vec::new();
        {
            let mut registry = self.registry()?;
            for (name, registration) in registry.namespaces.iter_mut() {
                if !registration.paths().iter().any(|p| key.starts_with(p.as_str())) {
                    continue;
                }
                let outcome = match registration.apply(Candidate::parse(key, value)) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::warn!(namespace = %name, key = %key, error = %e, "update failed");
                        UpdateOutcome::Failed { reason: e.to_string() }
                    }
                };
                applied.push((name.clone(), outcome, registration.callback()));
            }
        }
        applied.sort_by(|a, b| a.0.cmp(&b.0));

        let mut outcomes = Vec::with_capacity(applied.len());
        for (name, outcome, callback) in applied {
            if let (UpdateOutcome::Applied { field, previous }, Some(callback)) = (&outcome, callback) {
                callback(field, previous);
            }
            outcomes.push((name, outcome));
        }
        Ok(outcomes)
    }

    /// Registered namespace names, sorted.
    pub fn namespaces(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.registry()?.namespaces.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Namespaces reading `path`, in registration order.
    pub fn subscribers(&self, path: &str) -> Result<Vec<String>> {
        Ok(self
            .registry()?
            .subscribers
            .get(path)
            .cloned()
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for Configurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configurer")
            .field("bootstrap", &self.bootstrap)
            .field("store", &self.store.location())
            .finish()
    }
}
