use crate::schema::SchemaValidator;
use crate::tool::Tool;
use docucheck_protocol::{
    compare_versions, NoopSink, ObservabilitySink, ToolError, ToolKey, ToolSpec,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) struct Entry {
    pub(crate) spec: ToolSpec,
    pub(crate) tool: Arc<dyn Tool>,
    pub(crate) schema: SchemaValidator,
}

type Snapshot = BTreeMap<ToolKey, Arc<Entry>>;

/// Versioned tool registry.
///
/// Readers take a cheap `Arc` snapshot of the tool map; every registration
/// change builds a new map and swaps it in, so in-flight invocations keep
/// the view they started with.
pub struct ToolRegistry {
    entries: RwLock<Arc<Snapshot>>,
    pub(crate) sink: Arc<dyn ObservabilitySink>,
}

impl ToolRegistry {
    pub fn new(sink: Arc<dyn ObservabilitySink>) -> Self {
        Self {
            entries: RwLock::new(Arc::new(BTreeMap::new())),
            sink,
        }
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        self.entries.read().clone()
    }

    /// Registers `tool` under `spec`. A duplicate `(name, version)` is a
    /// REGISTRY_CONFLICT and leaves the existing registration untouched.
    pub fn register(&self, spec: ToolSpec, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let entry = build_entry(spec, tool)?;
        let key = entry.spec.key();

        let mut guard = self.entries.write();
        if guard.contains_key(&key) {
            warn!(tool = %key, "Rejected duplicate tool registration");
            return Err(ToolError::conflict(&key));
        }
        let mut next = (**guard).clone();
        next.insert(key.clone(), Arc::new(entry));
        *guard = Arc::new(next);
        drop(guard);

        info!(tool = %key, "Registered tool");
        Ok(())
    }

    /// Audited re-registration: swaps the implementation for `(name, version)`
    /// and returns the spec it replaced, if any.
    pub fn replace(&self, spec: ToolSpec, tool: Arc<dyn Tool>) -> Result<Option<ToolSpec>, ToolError> {
        let entry = build_entry(spec, tool)?;
        let key = entry.spec.key();

        let mut guard = self.entries.write();
        let mut next = (**guard).clone();
        let previous = next.insert(key.clone(), Arc::new(entry)).map(|e| e.spec.clone());
        *guard = Arc::new(next);
        drop(guard);

        match &previous {
            Some(old) => warn!(
                tool = %key,
                previous_description = %old.description,
                previous_timeout_seconds = old.limits.timeout_seconds,
                "Re-registered tool"
            ),
            None => info!(tool = %key, "Registered tool via replace"),
        }
        Ok(previous)
    }

    /// Audited removal of `(name, version)`.
    pub fn unregister(&self, name: &str, version: &str) -> Result<ToolSpec, ToolError> {
        let key = ToolKey::new(name, version);

        let mut guard = self.entries.write();
        if !guard.contains_key(&key) {
            return Err(ToolError::not_found(&key));
        }
        let mut next = (**guard).clone();
        let removed = next.remove(&key).map(|e| e.spec.clone());
        *guard = Arc::new(next);
        drop(guard);

        warn!(tool = %key, "Unregistered tool");
        removed.ok_or_else(|| ToolError::not_found(&key))
    }

    /// Registered specs ordered by name, then version.
    pub fn list_tools(&self) -> Vec<ToolSpec> {
        self.snapshot().values().map(|e| e.spec.clone()).collect()
    }

    pub fn get(&self, name: &str, version: Option<&str>) -> Option<ToolSpec> {
        self.resolve(name, version).map(|e| e.spec.clone())
    }

    pub fn count(&self) -> usize {
        self.snapshot().len()
    }

    /// Exact version when given, otherwise the highest registered version.
    pub(crate) fn resolve(&self, name: &str, version: Option<&str>) -> Option<Arc<Entry>> {
        let snapshot = self.snapshot();
        match version {
            Some(version) => snapshot.get(&ToolKey::new(name, version)).cloned(),
            None => snapshot
                .iter()
                .filter(|(key, _)| key.name == name)
                .max_by(|(a, _), (b, _)| compare_versions(&a.version, &b.version))
                .map(|(_, entry)| entry.clone()),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(Arc::new(NoopSink))
    }
}

fn build_entry(spec: ToolSpec, tool: Arc<dyn Tool>) -> Result<Entry, ToolError> {
    if spec.name.trim().is_empty() {
        return Err(ToolError::validation("Tool name must not be empty"));
    }
    if spec.version.trim().is_empty() {
        return Err(ToolError::validation(format!(
            "Tool {} must declare a version",
            spec.name
        )));
    }
    if spec.limits.timeout_seconds == 0 {
        return Err(ToolError::validation(format!(
            "Tool {} must declare a non-zero timeout",
            spec.name
        )));
    }
    let schema = SchemaValidator::compile(&tool.input_schema())?;
    Ok(Entry { spec, tool, schema })
}
