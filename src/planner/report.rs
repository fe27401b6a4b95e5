//! Deployment report types.
//!
//! A report is the engine's record of one `deploy` or `destroy` run:
//! per-resource final state, resolved attributes, and error detail on
//! the failing resource. It is everything a surrounding tool needs to
//! render a summary or pick an exit code.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{ResourceKind, ResourceState};

/// The operation a report describes.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanOperation {
    /// Resources were created in dependency order.
    Deploy,
    /// Resources were deleted in reverse dependency order.
    Destroy,
}

/// Outcome for a single resource.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceReport {
    /// Logical resource id.
    pub id: String,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Final lifecycle state after the run.
    pub state: ResourceState,
    /// Provider-assigned id, if the resource exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    /// Resolved attributes, if the resource exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<serde_json::Value>,
    /// Error detail, if this resource failed or was blocked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The complete result of a deploy or destroy run.
#[derive(Debug, Serialize)]
pub struct DeploymentReport {
    /// Which operation ran.
    pub operation: PlanOperation,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// The dependency order the run walked.
    pub order: Vec<String>,
    /// Per-resource outcomes, in walk order.
    pub resources: Vec<ResourceReport>,
    /// True if every attempted step succeeded.
    pub success: bool,
    /// Id of the first resource that failed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_resource: Option<String>,
}

impl DeploymentReport {
    /// Returns the number of resources in the created state.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.resources
            .iter()
            .filter(|r| r.state == ResourceState::Created)
            .count()
    }

    /// Returns the number of failed resources.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.resources
            .iter()
            .filter(|r| r.state == ResourceState::Failed)
            .count()
    }

    /// Returns the report entry for a resource id, if present.
    #[must_use]
    pub fn resource(&self, id: &str) -> Option<&ResourceReport> {
        self.resources.iter().find(|r| r.id == id)
    }
}

impl std::fmt::Display for PlanOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            Self::Deploy => "deploy",
            Self::Destroy => "destroy",
        };
        write!(f, "{op}")
    }
}

impl std::fmt::Display for DeploymentReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} {}: {} created, {} failed",
            self.operation,
            if self.success { "succeeded" } else { "failed" },
            self.created_count(),
            self.failed_count()
        )?;
        for resource in &self.resources {
            write!(f, "  {} [{}] {}", resource.id, resource.kind, resource.state)?;
            if let Some(error) = &resource.error {
                write!(f, " - {error}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
