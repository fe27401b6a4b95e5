//! The deployment plan orchestrator.
//!
//! A [`DeploymentPlan`] owns the declared resources and the tag policy
//! for one deployable unit. `deploy()` and `destroy()` run schema
//! validation and graph ordering first — both fail with zero provider
//! calls — and then delegate to the provisioning engine.

use tracing::{debug, info};

use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::model::{Resource, ResourceState, SchemaValidator, TagSet};
use crate::provider::ProviderApi;
use crate::resolver::ResourceStateStore;

use super::engine::{CancelFlag, ProvisioningEngine};
use super::report::DeploymentReport;

/// A set of declared resources plus the uniform tag policy.
#[derive(Debug)]
pub struct DeploymentPlan {
    /// Declared resources, in declaration order.
    resources: Vec<Resource>,
    /// Tags applied to every resource's create call. Not overridable
    /// per resource.
    tag_set: TagSet,
    /// Run-time state: resource states and resolved attributes.
    store: ResourceStateStore,
    /// Creation order of the last successful deploy.
    last_order: Option<Vec<String>>,
    /// Cancellation signal shared with the engine.
    cancel: CancelFlag,
}

impl DeploymentPlan {
    /// Creates a plan from declared resources and a tag set.
    #[must_use]
    pub fn new(resources: Vec<Resource>, tag_set: TagSet) -> Self {
        Self {
            resources,
            tag_set,
            store: ResourceStateStore::new(),
            last_order: None,
            cancel: CancelFlag::new(),
        }
    }

    /// Attaches a shared cancellation flag.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Seeds a resource as already created, typically from persisted
    /// state of an earlier run. Re-deploys skip it by id.
    pub fn seed_created(&mut self, id: &str, provider_id: &str, attributes: serde_json::Value) {
        self.store.record_created(id, provider_id, attributes);
        if let Some(resource) = self.resources.iter_mut().find(|r| r.id == id) {
            resource.state = ResourceState::Created;
        }
    }

    /// Seeds the creation order of an earlier successful deploy,
    /// typically from persisted state, so destroy walks its exact
    /// reverse.
    pub fn seed_order(&mut self, order: Vec<String>) {
        self.last_order = Some(order);
    }

    /// Validates declarations and computes the creation order.
    ///
    /// # Errors
    ///
    /// Returns a schema or cycle error; no provider call is made.
    pub fn order(&self) -> Result<Vec<String>> {
        SchemaValidator::new().validate(&self.resources)?;
        DependencyGraph::new().build(&self.resources)
    }

    /// Deploys the plan: validates, orders, then provisions.
    ///
    /// Re-invoking `deploy()` is idempotent — resources already created
    /// are left untouched and only the remaining ones are attempted.
    ///
    /// # Errors
    ///
    /// Returns schema or cycle errors before any provider call.
    /// Provider and resolution failures are reported per resource in
    /// the returned report.
    pub async fn deploy(&mut self, provider: &dyn ProviderApi) -> Result<DeploymentReport> {
        let order = self.order()?;
        info!(
            "Plan validated: {} resources, {} tags",
            self.resources.len(),
            self.tag_set.len()
        );

        let engine = ProvisioningEngine::new(provider).with_cancel_flag(self.cancel.clone());
        let report = engine
            .deploy(&mut self.resources, &order, &self.tag_set, &mut self.store)
            .await?;

        if report.success {
            self.last_order = Some(order);
        }
        Ok(report)
    }

    /// Destroys the plan's resources in reverse creation order.
    ///
    /// Uses the order of the last successful deploy when available, so
    /// teardown is exactly its reverse; otherwise the order is
    /// recomputed, which is deterministic on unchanged declarations.
    ///
    /// # Errors
    ///
    /// Returns schema or cycle errors before any provider call.
    pub async fn destroy(&mut self, provider: &dyn ProviderApi) -> Result<DeploymentReport> {
        let order = match &self.last_order {
            Some(order) => {
                debug!("Destroying in reverse of last deploy order");
                order.clone()
            }
            None => self.order()?,
        };

        let engine = ProvisioningEngine::new(provider).with_cancel_flag(self.cancel.clone());
        engine
            .destroy(&mut self.resources, &order, &mut self.store)
            .await
    }

    /// Returns the declared resources.
    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Returns the plan's tag set.
    #[must_use]
    pub const fn tag_set(&self) -> &TagSet {
        &self.tag_set
    }

    /// Returns the run-time state store, for persistence.
    #[must_use]
    pub const fn store(&self) -> &ResourceStateStore {
        &self.store
    }

    /// Final per-resource states, for reporting.
    #[must_use]
    pub fn resource_states(&self) -> Vec<(String, ResourceState)> {
        self.resources
            .iter()
            .map(|r| (r.id.clone(), self.store.state_of(&r.id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StackError;
    use crate::model::{ConfigValue, ResourceKind};
    use crate::provider::{MockProviderApi, SimulatedProvider};
    use serde_json::json;

    fn auth_stack() -> Vec<Resource> {
        vec![
            Resource::new("pool", ResourceKind::IdentityPool)
                .with_field("password_min_length", ConfigValue::literal(12)),
            Resource::new("domain", ResourceKind::IdentityDomain)
                .with_field("user_pool_id", ConfigValue::reference("pool", "id"))
                .with_field("domain_prefix", ConfigValue::literal("drewmcgrath")),
            Resource::new("handler", ResourceKind::ComputeFunction)
                .with_field("runtime", ConfigValue::literal("python3.9"))
                .with_field("handler", ConfigValue::literal("hello.hello_handler"))
                .with_field("code_path", ConfigValue::literal("lambda")),
            Resource::new("endpoint", ResourceKind::HttpEndpoint)
                .with_field("function_id", ConfigValue::reference("handler", "id")),
            Resource::new("client", ResourceKind::IdentityClient)
                .with_field("user_pool_id", ConfigValue::reference("pool", "id"))
                .with_field("access_token_validity_minutes", ConfigValue::literal(60))
                .with_field(
                    "callback_urls",
                    ConfigValue::List(vec![ConfigValue::Concat(vec![
                        ConfigValue::reference("endpoint", "url"),
                        ConfigValue::literal("*"),
                    ])]),
                )
                .with_field(
                    "oauth_flows",
                    ConfigValue::List(vec![ConfigValue::literal("authorization_code")]),
                ),
        ]
    }

    #[tokio::test]
    async fn deploys_the_full_stack() {
        let provider = SimulatedProvider::new();
        let mut plan = DeploymentPlan::new(auth_stack(), TagSet::new());

        let report = plan.deploy(&provider).await.unwrap();

        assert!(report.success);
        assert_eq!(report.created_count(), 5);
        assert_eq!(provider.resource_count().await, 5);

        // Every resource reached the created state.
        for (id, state) in plan.resource_states() {
            assert_eq!(state, ResourceState::Created, "{id} not created");
        }
    }

    #[tokio::test]
    async fn cycle_aborts_with_zero_provider_calls() {
        let resources = vec![
            Resource::new("a", ResourceKind::IdentityPool)
                .with_field("peer", ConfigValue::reference("b", "id")),
            Resource::new("b", ResourceKind::IdentityPool)
                .with_field("peer", ConfigValue::reference("a", "id")),
        ];
        let mut provider = MockProviderApi::new();
        provider.expect_create().times(0);
        provider.expect_delete().times(0);

        let mut plan = DeploymentPlan::new(resources, TagSet::new());
        let err = plan.deploy(&provider).await.unwrap_err();

        let StackError::Cycle(cycle) = err else {
            panic!("expected cycle error, got {err}");
        };
        assert_eq!(cycle.participants, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn schema_violations_abort_with_zero_provider_calls() {
        let resources = vec![
            Resource::new("pool", ResourceKind::IdentityPool)
                .with_field("password_min_length", ConfigValue::literal(4)),
        ];
        let mut provider = MockProviderApi::new();
        provider.expect_create().times(0);

        let mut plan = DeploymentPlan::new(resources, TagSet::new());
        let err = plan.deploy(&provider).await.unwrap_err();
        assert!(matches!(err, StackError::Schema(_)));
    }

    #[tokio::test]
    async fn destroy_removes_everything_deployed() {
        let provider = SimulatedProvider::new();
        let mut plan = DeploymentPlan::new(auth_stack(), TagSet::new());
        plan.deploy(&provider).await.unwrap();

        let report = plan.destroy(&provider).await.unwrap();

        assert!(report.success);
        assert_eq!(provider.resource_count().await, 0);
    }

    #[tokio::test]
    async fn seeded_resources_are_skipped_on_deploy() {
        let provider = SimulatedProvider::new();
        let mut plan = DeploymentPlan::new(auth_stack(), TagSet::new());

        // Pretend the pool already exists from an earlier run.
        plan.seed_created("pool", "pool-existing", json!({ "id": "pool-existing" }));

        let report = plan.deploy(&provider).await.unwrap();

        assert!(report.success);
        // Four creates, not five: the seeded pool is untouched.
        assert_eq!(provider.resource_count().await, 4);
        let pool = report.resource("pool").unwrap();
        assert_eq!(pool.provider_id.as_deref(), Some("pool-existing"));
    }

    #[tokio::test]
    async fn tag_policy_reaches_the_provider() {
        let provider = SimulatedProvider::new();
        let tags = TagSet::from_pairs(vec![(
            String::from("Environment"),
            String::from("development"),
        )]);
        let mut plan = DeploymentPlan::new(auth_stack(), tags);

        let report = plan.deploy(&provider).await.unwrap();
        let pool = report.resource("pool").unwrap();
        let attributes = pool.attributes.as_ref().unwrap();
        assert_eq!(attributes["tags"]["Environment"], json!("development"));
    }
}
