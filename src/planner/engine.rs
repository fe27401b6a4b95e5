//! The provisioning engine.
//!
//! Walks resources strictly sequentially in dependency order, one
//! provider call at a time, so every run produces a single linear log
//! of resource operations. References are substituted immediately
//! before each create; resolution for a step completes fully before
//! any state mutation for the next step begins.
//!
//! Failure policy: the first create failure stops forward progress and
//! is returned in the partial report. Already-created resources are
//! left in place (no automatic rollback, no automatic retry); the
//! caller can inspect the report and either re-deploy (idempotent,
//! created resources are skipped by id) or destroy.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

use crate::error::{ProviderError, Result, StackError};
use crate::model::{Resource, ResourceState, TagSet};
use crate::provider::{CreateRequest, ProviderApi};
use crate::resolver::{ReferenceResolver, ResourceStateStore};

use super::report::{DeploymentReport, PlanOperation, ResourceReport};

/// A cancellation signal checked between resource steps.
///
/// Cancelling never interrupts an in-flight provider call; it halts
/// further creates or deletes, leaving processed resources in their
/// last reported state.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Creates a new, unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true if cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Executes ordered provisioning plans against a provider.
pub struct ProvisioningEngine<'a> {
    /// The external provider.
    provider: &'a dyn ProviderApi,
    /// Reference resolver, reads the state store this engine mutates.
    resolver: ReferenceResolver,
    /// Cancellation signal.
    cancel: CancelFlag,
}

impl<'a> ProvisioningEngine<'a> {
    /// Creates an engine backed by the given provider.
    #[must_use]
    pub fn new(provider: &'a dyn ProviderApi) -> Self {
        Self {
            provider,
            resolver: ReferenceResolver::new(),
            cancel: CancelFlag::new(),
        }
    }

    /// Attaches a shared cancellation flag.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Creates every resource in the given creation order.
    ///
    /// Resources already recorded as created in `store` are skipped
    /// without any provider call. The uniform `tags` are applied to
    /// every create request.
    ///
    /// # Errors
    ///
    /// Returns an error only for internal inconsistencies (an ordered
    /// id with no declaration). Resolution and provider failures are
    /// reported per resource inside the returned report.
    pub async fn deploy(
        &self,
        resources: &mut [Resource],
        order: &[String],
        tags: &TagSet,
        store: &mut ResourceStateStore,
    ) -> Result<DeploymentReport> {
        let started_at = Utc::now();
        info!("Deploying {} resources", order.len());

        for resource in resources.iter() {
            store.declare(&resource.id);
        }

        let mut errors: HashMap<String, String> = HashMap::new();
        let mut failed_resource = None;

        for id in order {
            if self.cancel.is_cancelled() {
                warn!("Deployment cancelled before '{id}', stopping");
                break;
            }

            if store.is_created(id) {
                debug!("Resource '{id}' already created, skipping");
                continue;
            }

            let resource = find_mut(resources, id)?;
            resource.state = ResourceState::Resolving;
            store.mark_resolving(id);

            let resolved = match self.resolve_config(resource, store) {
                Ok(resolved) => resolved,
                Err(e) => {
                    error!("Failed to resolve references for '{id}': {e}");
                    resource.state = ResourceState::Failed;
                    store.mark_failed(id);
                    errors.insert(id.clone(), e.to_string());
                    failed_resource = Some(id.clone());
                    break;
                }
            };

            let request = CreateRequest {
                resource_id: id.clone(),
                kind: resource.kind,
                config: resolved,
                tags: tags.pairs().to_vec(),
            };

            info!("Creating {} '{id}'", resource.kind);
            match self.provider.create(request).await {
                Ok(created) => {
                    info!("Created '{id}' as {}", created.provider_id);
                    resource.state = ResourceState::Created;
                    store.record_created(id, &created.provider_id, created.attributes);
                }
                Err(e) => {
                    error!("Provider failed to create '{id}': {e}");
                    resource.state = ResourceState::Failed;
                    store.mark_failed(id);
                    errors.insert(id.clone(), e.to_string());
                    failed_resource = Some(id.clone());
                    break;
                }
            }
        }

        Ok(build_report(
            PlanOperation::Deploy,
            started_at,
            order,
            resources,
            store,
            &errors,
            failed_resource,
        ))
    }

    /// Deletes resources in reverse creation order.
    ///
    /// A delete failure does not block independent resources, but it
    /// blocks deleting everything the failed resource (transitively)
    /// references, to avoid dangling references. All failures are
    /// collected and reported together.
    ///
    /// # Errors
    ///
    /// Returns an error only for internal inconsistencies; per-resource
    /// delete failures are reported inside the returned report.
    pub async fn destroy(
        &self,
        resources: &mut [Resource],
        order: &[String],
        store: &mut ResourceStateStore,
    ) -> Result<DeploymentReport> {
        let started_at = Utc::now();
        info!("Destroying {} resources", order.len());

        let targets_of = dependency_targets(resources);
        let mut blocked: HashSet<String> = HashSet::new();
        let mut errors: HashMap<String, String> = HashMap::new();
        let mut first_failure = None;

        for id in order.iter().rev() {
            if self.cancel.is_cancelled() {
                warn!("Destroy cancelled before '{id}', stopping");
                break;
            }

            if blocked.contains(id) {
                warn!("Skipping delete of '{id}': a dependent failed to delete");
                errors.insert(
                    id.clone(),
                    String::from("blocked: a resource referencing this one failed to delete"),
                );
                continue;
            }

            let Some(provider_id) = store.provider_id_of(id).map(ToString::to_string) else {
                debug!("Resource '{id}' was never created, nothing to delete");
                continue;
            };

            info!("Deleting '{id}' ({provider_id})");
            match self.provider.delete(&provider_id).await {
                Ok(()) => {
                    store.remove(id);
                    if let Ok(resource) = find_mut(resources, id) {
                        resource.state = ResourceState::Declared;
                    }
                }
                Err(StackError::Provider(ProviderError::NotFound { .. })) => {
                    debug!("Resource '{id}' already gone at the provider");
                    store.remove(id);
                    if let Ok(resource) = find_mut(resources, id) {
                        resource.state = ResourceState::Declared;
                    }
                }
                Err(e) => {
                    error!("Failed to delete '{id}': {e}");
                    errors.insert(id.clone(), e.to_string());
                    if first_failure.is_none() {
                        first_failure = Some(id.clone());
                    }
                    if let Ok(resource) = find_mut(resources, id) {
                        resource.state = ResourceState::Failed;
                    }
                    store.mark_failed(id);
                    block_targets(id, &targets_of, &mut blocked);
                }
            }
        }

        let reverse: Vec<String> = order.iter().rev().cloned().collect();
        Ok(build_report(
            PlanOperation::Destroy,
            started_at,
            &reverse,
            resources,
            store,
            &errors,
            first_failure,
        ))
    }

    /// Substitutes every reference in a resource's config.
    fn resolve_config(
        &self,
        resource: &Resource,
        store: &ResourceStateStore,
    ) -> Result<serde_json::Value> {
        let mut resolved = serde_json::Map::new();
        for (field, value) in &resource.config {
            resolved.insert(field.clone(), self.resolver.resolve_value(value, store)?);
        }
        Ok(serde_json::Value::Object(resolved))
    }
}

/// Finds a declared resource by id.
fn find_mut<'r>(resources: &'r mut [Resource], id: &str) -> Result<&'r mut Resource> {
    resources
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| StackError::internal(format!("ordered id '{id}' has no declaration")))
}

/// Direct reference targets per resource id.
fn dependency_targets(resources: &[Resource]) -> HashMap<String, Vec<String>> {
    resources
        .iter()
        .map(|r| {
            let targets = r
                .references()
                .iter()
                .map(|reference| reference.target_id.clone())
                .collect();
            (r.id.clone(), targets)
        })
        .collect()
}

/// Marks everything `id` transitively references as blocked.
fn block_targets(id: &str, targets_of: &HashMap<String, Vec<String>>, blocked: &mut HashSet<String>) {
    let mut pending = vec![id.to_string()];
    while let Some(current) = pending.pop() {
        if let Some(targets) = targets_of.get(&current) {
            for target in targets {
                if blocked.insert(target.clone()) {
                    pending.push(target.clone());
                }
            }
        }
    }
}

/// Assembles the per-resource report from the state store.
fn build_report(
    operation: PlanOperation,
    started_at: chrono::DateTime<Utc>,
    order: &[String],
    resources: &[Resource],
    store: &ResourceStateStore,
    errors: &HashMap<String, String>,
    failed_resource: Option<String>,
) -> DeploymentReport {
    let entries = order
        .iter()
        .filter_map(|id| {
            let resource = resources.iter().find(|r| r.id == *id)?;
            let record = store.record(id);
            Some(ResourceReport {
                id: id.clone(),
                kind: resource.kind,
                state: record.map_or(resource.state, |r| r.state),
                provider_id: record.and_then(|r| r.provider_id.clone()),
                attributes: record
                    .filter(|r| r.state == ResourceState::Created)
                    .map(|r| r.attributes.clone()),
                error: errors.get(id).cloned(),
            })
        })
        .collect();

    DeploymentReport {
        operation,
        started_at,
        finished_at: Utc::now(),
        order: order.to_vec(),
        resources: entries,
        success: errors.is_empty(),
        failed_resource,
    }
}
