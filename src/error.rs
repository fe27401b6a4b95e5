//! Error types for the stackpilot provisioning engine.
//!
//! This module provides the error hierarchy for the whole deployment
//! lifecycle: declaration validation, graph ordering, reference
//! resolution, provider calls, and state management.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for stackpilot operations.
#[derive(Debug, Error)]
pub enum StackError {
    /// Declaration schema validation failed.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The dependency graph contains a cycle.
    #[error("Cycle error: {0}")]
    Cycle(#[from] CycleError),

    /// Reference resolution failed.
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// A provider call failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Stack state management failed.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Configuration loading or parsing failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A single schema violation found during declaration validation.
#[derive(Debug, Clone)]
pub struct SchemaViolation {
    /// Id of the resource the violation belongs to.
    pub resource_id: String,
    /// The configuration field that failed validation.
    pub field: String,
    /// Human-readable description of the violation.
    pub message: String,
}

/// Declaration validation failure.
///
/// Carries every violation found in one pass, not just the first, so a
/// caller can fix the whole declaration set at once.
#[derive(Debug, Clone, Error)]
#[error("{} validation violation(s): {}", violations.len(), summary(violations))]
pub struct SchemaError {
    /// All violations found.
    pub violations: Vec<SchemaViolation>,
}

/// Unsatisfiable dependency graph.
#[derive(Debug, Clone, Error)]
#[error("dependency cycle between resources: {}", participants.join(", "))]
pub struct CycleError {
    /// Ids of the resources participating in the cycle, in declaration order.
    pub participants: Vec<String>,
}

/// Reference resolution errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The reference target has not been created yet.
    #[error("reference to '{target_id}' cannot resolve: resource is {target_state}, not created")]
    UnresolvedReference {
        /// Id of the referenced resource.
        target_id: String,
        /// State the target was observed in.
        target_state: String,
    },

    /// The target is created but lacks the requested attribute.
    #[error("resource '{target_id}' has no attribute '{attribute_path}'")]
    MissingAttribute {
        /// Id of the referenced resource.
        target_id: String,
        /// The attribute path that was requested.
        attribute_path: String,
    },

    /// The reference points at a resource that was never declared.
    #[error("reference to unknown resource '{target_id}'")]
    UnknownTarget {
        /// Id of the missing resource.
        target_id: String,
    },
}

/// Errors surfaced by the external provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The create call for a resource failed.
    #[error("failed to create '{resource_id}': {message}")]
    CreateFailed {
        /// Logical id of the resource being created.
        resource_id: String,
        /// Error detail from the provider.
        message: String,
    },

    /// The delete call for a resource failed.
    #[error("failed to delete '{provider_id}': {message}")]
    DeleteFailed {
        /// Provider-assigned id of the resource.
        provider_id: String,
        /// Error detail from the provider.
        message: String,
    },

    /// The provider does not know the resource.
    #[error("resource not found: {provider_id}")]
    NotFound {
        /// Provider-assigned id that was looked up.
        provider_id: String,
    },

    /// The provider rejected the request for rate-limiting reasons.
    #[error("provider throttled the request, retry after {retry_after_secs} seconds")]
    Throttled {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Transport-level failure talking to the provider.
    #[error("network error communicating with provider: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },
}

/// Stack state management errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// State is corrupted or unreadable.
    #[error("state is corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// State serialization failed.
    #[error("state serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
    },

    /// State version mismatch.
    #[error("state version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected state format version.
        expected: String,
        /// Version found in the file.
        found: String,
    },
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The stack file was not found.
    #[error("stack file not found: {path}")]
    FileNotFound {
        /// Path that was searched.
        path: PathBuf,
    },

    /// The stack file could not be parsed.
    #[error("failed to parse stack file: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },
}

/// Result type alias for stackpilot operations.
pub type Result<T> = std::result::Result<T, StackError>;

fn summary(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl StackError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Provider(ProviderError::Throttled { .. } | ProviderError::Network { .. })
        )
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::Provider(ProviderError::Throttled { retry_after_secs }) => {
                Some(*retry_after_secs)
            }
            Self::Provider(ProviderError::Network { .. }) => Some(5),
            _ => None,
        }
    }
}

impl SchemaError {
    /// Creates a schema error from collected violations.
    #[must_use]
    pub const fn new(violations: Vec<SchemaViolation>) -> Self {
        Self { violations }
    }
}

impl SchemaViolation {
    /// Creates a violation for a field of a resource.
    #[must_use]
    pub fn new(
        resource_id: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ProviderError {
    /// Creates a create failure for a resource.
    #[must_use]
    pub fn create_failed(resource_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CreateFailed {
            resource_id: resource_id.into(),
            message: message.into(),
        }
    }

    /// Creates a network error with the given message.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }
}

impl StateError {
    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}: {}", self.resource_id, self.field, self.message)
    }
}
