//! Core resource model for the deployment graph.
//!
//! These types are pure data: a [`Resource`] is a declared intent, its
//! [`ConfigValue`] fields hold either literal values or lazy
//! [`Reference`]s to attributes of other resources, and a [`TagSet`]
//! is the uniform tag policy applied to every provider create call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The resource kinds this engine knows how to provision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A user identity pool.
    IdentityPool,
    /// A hosted sign-in domain attached to an identity pool.
    IdentityDomain,
    /// An OAuth-capable application client of an identity pool.
    IdentityClient,
    /// A compute function.
    ComputeFunction,
    /// An HTTP entry point integrated with a compute function.
    HttpEndpoint,
}

/// Lifecycle state of a declared resource.
///
/// State only advances `Declared` → `Resolving` → `Created`, or from
/// any state to `Failed`, which is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    /// Declared but not yet processed.
    #[default]
    Declared,
    /// References are being substituted.
    Resolving,
    /// The provider call succeeded and real attributes are stored.
    Created,
    /// Processing failed. Terminal.
    Failed,
}

/// A lazy pointer to an attribute of another resource.
///
/// Stands in for a value that is only known after the target resource
/// has been created, e.g. an endpoint's assigned URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reference {
    /// Id of the resource the value comes from.
    pub target_id: String,
    /// Dotted path into the target's attribute object.
    pub attribute_path: String,
}

/// A configuration field value: literal, lazy, or composed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ConfigValue {
    /// A concrete value known at declaration time.
    Literal(serde_json::Value),
    /// A lazy pointer resolved at provisioning time.
    Reference(Reference),
    /// String concatenation of parts, resolved left to right.
    ///
    /// Exists for patterns like a wildcard callback URL, where a
    /// resolved endpoint URL is suffixed with a literal `*`.
    Concat(Vec<ConfigValue>),
    /// An ordered list of values.
    List(Vec<ConfigValue>),
}

/// A declared resource in the deployment graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    /// Unique id within the graph.
    pub id: String,
    /// What kind of resource this is.
    pub kind: ResourceKind,
    /// Configuration fields, literal or reference-valued.
    pub config: BTreeMap<String, ConfigValue>,
    /// Current lifecycle state.
    #[serde(default)]
    pub state: ResourceState,
}

/// Ordered `(key, value)` tag pairs applied identically to every resource.
///
/// Set once per plan and immutable during a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TagSet {
    tags: Vec<(String, String)>,
}

impl Reference {
    /// Creates a reference to an attribute of another resource.
    #[must_use]
    pub fn new(target_id: impl Into<String>, attribute_path: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            attribute_path: attribute_path.into(),
        }
    }
}

impl ConfigValue {
    /// Creates a literal value.
    #[must_use]
    pub fn literal(value: impl Into<serde_json::Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Creates a reference value.
    #[must_use]
    pub fn reference(target_id: impl Into<String>, attribute_path: impl Into<String>) -> Self {
        Self::Reference(Reference::new(target_id, attribute_path))
    }

    /// Returns the literal as a string, if this is a string literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Literal(value) => value.as_str(),
            _ => None,
        }
    }

    /// Returns the literal as an unsigned integer, if applicable.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Literal(value) => value.as_u64(),
            _ => None,
        }
    }

    /// Returns true if the value is a reference or contains one.
    #[must_use]
    pub fn has_references(&self) -> bool {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        !refs.is_empty()
    }

    /// Collects every reference embedded in this value, in order.
    pub fn collect_references<'a>(&'a self, out: &mut Vec<&'a Reference>) {
        match self {
            Self::Literal(_) => {}
            Self::Reference(reference) => out.push(reference),
            Self::Concat(parts) | Self::List(parts) => {
                for part in parts {
                    part.collect_references(out);
                }
            }
        }
    }
}

impl Resource {
    /// Creates a new resource declaration with an empty config.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            kind,
            config: BTreeMap::new(),
            state: ResourceState::Declared,
        }
    }

    /// Adds a configuration field (builder style).
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: ConfigValue) -> Self {
        self.config.insert(name.into(), value);
        self
    }

    /// Looks up a configuration field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ConfigValue> {
        self.config.get(name)
    }

    /// Returns every reference embedded anywhere in this resource's config.
    #[must_use]
    pub fn references(&self) -> Vec<&Reference> {
        let mut refs = Vec::new();
        for value in self.config.values() {
            value.collect_references(&mut refs);
        }
        refs
    }
}

impl TagSet {
    /// Creates an empty tag set.
    #[must_use]
    pub const fn new() -> Self {
        Self { tags: Vec::new() }
    }

    /// Creates a tag set from ordered pairs.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { tags: pairs }
    }

    /// Returns the pairs in declaration order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.tags
    }

    /// Returns true if no tags are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Returns the number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }
}

impl ResourceState {
    /// Returns true if the state admits no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl ResourceKind {
    /// Returns the canonical kind name used in configs and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::IdentityPool => "identity_pool",
            Self::IdentityDomain => "identity_domain",
            Self::IdentityClient => "identity_client",
            Self::ComputeFunction => "compute_function",
            Self::HttpEndpoint => "http_endpoint",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::fmt::Display for ResourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self {
            Self::Declared => "declared",
            Self::Resolving => "resolving",
            Self::Created => "created",
            Self::Failed => "failed",
        };
        write!(f, "{state}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_references_through_nested_values() {
        let resource = Resource::new("client", ResourceKind::IdentityClient)
            .with_field("user_pool_id", ConfigValue::reference("pool", "id"))
            .with_field(
                "callback_urls",
                ConfigValue::List(vec![ConfigValue::Concat(vec![
                    ConfigValue::reference("endpoint", "url"),
                    ConfigValue::literal("*"),
                ])]),
            )
            .with_field("client_name", ConfigValue::literal("auth-client"));

        let refs = resource.references();
        let targets: Vec<&str> = refs.iter().map(|r| r.target_id.as_str()).collect();
        assert_eq!(targets.len(), 2);
        assert!(targets.contains(&"pool"));
        assert!(targets.contains(&"endpoint"));
    }

    #[test]
    fn literal_accessors() {
        let value = ConfigValue::literal(12);
        assert_eq!(value.as_u64(), Some(12));
        assert_eq!(value.as_str(), None);
        assert!(!value.has_references());
    }

    #[test]
    fn tag_set_preserves_order() {
        let tags = TagSet::from_pairs(vec![
            (String::from("Environment"), String::from("development")),
            (String::from("CleanUp"), String::from("true")),
        ]);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.pairs()[0].0, "Environment");
        assert_eq!(tags.pairs()[1].0, "CleanUp");
    }
}
