//! Persisted stack state.
//!
//! Records what an earlier deploy created — provider ids, attributes,
//! and the creation order — so a later CLI invocation can re-apply
//! idempotently or destroy in exact reverse order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::ResourceKind;

/// Current version of the state format.
pub const STATE_VERSION: &str = "1.0";

/// The complete persisted stack state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackState {
    /// State format version.
    pub version: String,
    /// Project name.
    pub project: String,
    /// Environment name.
    pub environment: String,
    /// Creation order of the last successful deploy.
    pub order: Vec<String>,
    /// Recorded resources, by logical id.
    pub resources: HashMap<String, RecordedResource>,
    /// When the state was last updated.
    pub last_updated: DateTime<Utc>,
}

/// One created resource as recorded after a deploy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedResource {
    /// Logical id within the stack.
    pub id: String,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Provider-assigned id.
    pub provider_id: String,
    /// Attributes returned by the provider.
    pub attributes: serde_json::Value,
    /// When the resource was recorded.
    pub created_at: DateTime<Utc>,
}

impl StackState {
    /// Creates a new empty stack state.
    #[must_use]
    pub fn new(project: &str, environment: &str) -> Self {
        Self {
            version: STATE_VERSION.to_string(),
            project: project.to_string(),
            environment: environment.to_string(),
            order: Vec::new(),
            resources: HashMap::new(),
            last_updated: Utc::now(),
        }
    }

    /// Gets a recorded resource by logical id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&RecordedResource> {
        self.resources.get(id)
    }

    /// Adds or replaces a recorded resource.
    pub fn set(&mut self, resource: RecordedResource) {
        self.resources.insert(resource.id.clone(), resource);
        self.last_updated = Utc::now();
    }

    /// Removes a recorded resource by logical id.
    pub fn remove(&mut self, id: &str) -> Option<RecordedResource> {
        let removed = self.resources.remove(id);
        if removed.is_some() {
            self.last_updated = Utc::now();
        }
        removed
    }

    /// Returns true if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl RecordedResource {
    /// Creates a recorded resource from a provider response.
    #[must_use]
    pub fn new(
        id: &str,
        kind: ResourceKind,
        provider_id: &str,
        attributes: serde_json::Value,
    ) -> Self {
        Self {
            id: id.to_string(),
            kind,
            provider_id: provider_id.to_string(),
            attributes,
            created_at: Utc::now(),
        }
    }
}
