//! Planning and provisioning.
//!
//! This module turns declared resources into ordered, idempotent
//! deploy and destroy runs: the plan validates and orders, the engine
//! executes against the provider, the report records the outcome.

mod engine;
mod plan;
mod report;

pub use engine::{CancelFlag, ProvisioningEngine};
pub use plan::DeploymentPlan;
pub use report::{DeploymentReport, PlanOperation, ResourceReport};
