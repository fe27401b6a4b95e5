//! Lazy reference resolution against the run-time state store.
//!
//! The [`ResourceStateStore`] is written only by the provisioning
//! engine and read here. Resolution is a pure lookup: the engine's
//! ordering already guarantees a reference target was visited earlier,
//! but the resolver re-checks the target's state independently so that
//! misuse fails loudly instead of substituting a stale or partial
//! value.

use std::collections::HashMap;
use tracing::trace;

use crate::error::{ResolveError, Result};
use crate::model::{ConfigValue, Reference, ResourceState};

/// What the engine has recorded about one resource during a run.
#[derive(Debug, Clone, Default)]
pub struct ResourceRecord {
    /// Current lifecycle state.
    pub state: ResourceState,
    /// Provider-assigned id, present once created.
    pub provider_id: Option<String>,
    /// Attribute object returned by the provider's create call.
    pub attributes: serde_json::Value,
}

/// Per-run store of resource states and resolved attributes.
///
/// Mutated only by the provisioning engine; execution is
/// single-threaded, so no locking is needed.
#[derive(Debug, Default)]
pub struct ResourceStateStore {
    records: HashMap<String, ResourceRecord>,
}

/// Resolves lazy references to concrete values.
#[derive(Debug, Default)]
pub struct ReferenceResolver;

impl ResourceStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a declared resource with no attributes yet.
    pub fn declare(&mut self, id: &str) {
        self.records.entry(id.to_string()).or_default();
    }

    /// Marks a resource as having its references substituted.
    pub fn mark_resolving(&mut self, id: &str) {
        self.records.entry(id.to_string()).or_default().state = ResourceState::Resolving;
    }

    /// Records a successful creation with the provider's response.
    pub fn record_created(&mut self, id: &str, provider_id: &str, attributes: serde_json::Value) {
        let record = self.records.entry(id.to_string()).or_default();
        record.state = ResourceState::Created;
        record.provider_id = Some(provider_id.to_string());
        record.attributes = attributes;
    }

    /// Marks a resource as failed. Terminal.
    pub fn mark_failed(&mut self, id: &str) {
        self.records.entry(id.to_string()).or_default().state = ResourceState::Failed;
    }

    /// Removes a resource's record after deletion.
    pub fn remove(&mut self, id: &str) -> Option<ResourceRecord> {
        self.records.remove(id)
    }

    /// Returns the record for a resource, if any.
    #[must_use]
    pub fn record(&self, id: &str) -> Option<&ResourceRecord> {
        self.records.get(id)
    }

    /// Returns the state of a resource, `Declared` if never touched.
    #[must_use]
    pub fn state_of(&self, id: &str) -> ResourceState {
        self.records.get(id).map_or_else(Default::default, |r| r.state)
    }

    /// Returns true if the resource is recorded as created.
    #[must_use]
    pub fn is_created(&self, id: &str) -> bool {
        self.state_of(id) == ResourceState::Created
    }

    /// Returns the provider id of a created resource.
    #[must_use]
    pub fn provider_id_of(&self, id: &str) -> Option<&str> {
        self.records.get(id).and_then(|r| r.provider_id.as_deref())
    }
}

impl ReferenceResolver {
    /// Creates a new resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolves a single reference to a concrete value.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownTarget`] if the target was never
    /// declared, [`ResolveError::UnresolvedReference`] if it is not yet
    /// created, and [`ResolveError::MissingAttribute`] if the created
    /// target lacks the requested attribute path.
    pub fn resolve(
        &self,
        reference: &Reference,
        store: &ResourceStateStore,
    ) -> Result<serde_json::Value> {
        let Some(record) = store.record(&reference.target_id) else {
            return Err(ResolveError::UnknownTarget {
                target_id: reference.target_id.clone(),
            }
            .into());
        };

        if record.state != ResourceState::Created {
            return Err(ResolveError::UnresolvedReference {
                target_id: reference.target_id.clone(),
                target_state: record.state.to_string(),
            }
            .into());
        }

        let value = lookup_path(&record.attributes, &reference.attribute_path).ok_or_else(|| {
            ResolveError::MissingAttribute {
                target_id: reference.target_id.clone(),
                attribute_path: reference.attribute_path.clone(),
            }
        })?;

        trace!(
            "Resolved {}.{} = {}",
            reference.target_id, reference.attribute_path, value
        );
        Ok(value.clone())
    }

    /// Resolves a whole config value tree to concrete JSON.
    ///
    /// `Concat` parts are resolved left to right and joined as a
    /// string; `List` maps to a JSON array.
    ///
    /// # Errors
    ///
    /// Propagates any reference resolution failure.
    pub fn resolve_value(
        &self,
        value: &ConfigValue,
        store: &ResourceStateStore,
    ) -> Result<serde_json::Value> {
        match value {
            ConfigValue::Literal(literal) => Ok(literal.clone()),
            ConfigValue::Reference(reference) => self.resolve(reference, store),
            ConfigValue::Concat(parts) => {
                let mut joined = String::new();
                for part in parts {
                    joined.push_str(&stringify(&self.resolve_value(part, store)?));
                }
                Ok(serde_json::Value::String(joined))
            }
            ConfigValue::List(items) => {
                let resolved: Result<Vec<_>> = items
                    .iter()
                    .map(|item| self.resolve_value(item, store))
                    .collect();
                Ok(serde_json::Value::Array(resolved?))
            }
        }
    }
}

/// Follows a dotted path into a JSON object.
fn lookup_path<'a>(attributes: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut current = attributes;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Renders a resolved value for concatenation.
fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn created_store() -> ResourceStateStore {
        let mut store = ResourceStateStore::new();
        store.declare("endpoint");
        store.record_created(
            "endpoint",
            "ep-0001",
            json!({ "id": "ep-0001", "url": "https://ep-0001.example.test/prod/" }),
        );
        store
    }

    #[test]
    fn resolves_created_attribute() {
        let store = created_store();
        let value = ReferenceResolver::new()
            .resolve(&Reference::new("endpoint", "url"), &store)
            .unwrap();
        assert_eq!(value, json!("https://ep-0001.example.test/prod/"));
    }

    #[test]
    fn declared_target_is_unresolved() {
        let mut store = ResourceStateStore::new();
        store.declare("pool");

        let err = ReferenceResolver::new()
            .resolve(&Reference::new("pool", "id"), &store)
            .unwrap_err();
        assert!(err.to_string().contains("is declared, not created"));
    }

    #[test]
    fn missing_attribute_never_defaults() {
        let store = created_store();

        let err = ReferenceResolver::new()
            .resolve(&Reference::new("endpoint", "arn"), &store)
            .unwrap_err();
        assert!(err.to_string().contains("no attribute 'arn'"));
    }

    #[test]
    fn nested_attribute_paths() {
        let mut store = ResourceStateStore::new();
        store.declare("pool");
        store.record_created("pool", "pool-1", json!({ "policy": { "min_length": 12 } }));

        let value = ReferenceResolver::new()
            .resolve(&Reference::new("pool", "policy.min_length"), &store)
            .unwrap();
        assert_eq!(value, json!(12));
    }

    #[test]
    fn concat_builds_wildcard_url() {
        let store = created_store();
        let value = ConfigValue::Concat(vec![
            ConfigValue::reference("endpoint", "url"),
            ConfigValue::literal("*"),
        ]);

        let resolved = ReferenceResolver::new()
            .resolve_value(&value, &store)
            .unwrap();
        assert_eq!(resolved, json!("https://ep-0001.example.test/prod/*"));
    }

    #[test]
    fn unknown_target_is_reported() {
        let store = ResourceStateStore::new();
        let err = ReferenceResolver::new()
            .resolve(&Reference::new("ghost", "id"), &store)
            .unwrap_err();
        assert!(err.to_string().contains("unknown resource 'ghost'"));
    }
}
