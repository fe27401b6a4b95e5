//! The external provider interface.
//!
//! The engine never talks to a cloud API directly; everything goes
//! through the [`ProviderApi`] trait. Any attribute not present in the
//! immediate `create` response is unavailable to reference resolution
//! until a later `describe` call.
//!
//! [`SimulatedProvider`] is an in-memory implementation with
//! deterministic ids and kind-appropriate attributes, so the CLI can
//! be exercised end to end without credentials.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{ProviderError, Result};
use crate::model::ResourceKind;

/// A fully resolved create request for one resource.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    /// Logical id of the resource within the plan.
    pub resource_id: String,
    /// Kind of resource to create.
    pub kind: ResourceKind,
    /// Resolved configuration, references already substituted.
    pub config: serde_json::Value,
    /// Tags to apply, in declaration order.
    pub tags: Vec<(String, String)>,
}

/// The provider's response to a successful create.
#[derive(Debug, Clone)]
pub struct CreatedResource {
    /// Provider-assigned identifier.
    pub provider_id: String,
    /// Attribute object available to later references.
    pub attributes: serde_json::Value,
}

/// The narrow interface to the external provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderApi: Send + Sync {
    /// Creates a resource from a resolved configuration.
    async fn create(&self, request: CreateRequest) -> Result<CreatedResource>;

    /// Deletes a resource by its provider-assigned id.
    async fn delete(&self, provider_id: &str) -> Result<()>;

    /// Fetches the current attributes of a resource.
    async fn describe(&self, provider_id: &str) -> Result<serde_json::Value>;
}

/// In-memory provider with deterministic ids.
#[derive(Debug, Default)]
pub struct SimulatedProvider {
    inner: Mutex<SimulatedState>,
}

#[derive(Debug, Default)]
struct SimulatedState {
    sequence: u32,
    resources: HashMap<String, serde_json::Value>,
    fault: Option<ProviderError>,
}

impl SimulatedProvider {
    /// Creates an empty simulated provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live simulated resources.
    pub async fn resource_count(&self) -> usize {
        self.inner.lock().await.resources.len()
    }

    /// Arranges for the next `create` call to fail with `fault`.
    ///
    /// The fault is consumed by the call it fails; simulates transient
    /// conditions like throttling or a dropped connection.
    pub async fn inject_create_fault(&self, fault: ProviderError) {
        self.inner.lock().await.fault = Some(fault);
    }

    fn id_prefix(kind: ResourceKind) -> &'static str {
        match kind {
            ResourceKind::IdentityPool => "pool",
            ResourceKind::IdentityDomain => "domain",
            ResourceKind::IdentityClient => "client",
            ResourceKind::ComputeFunction => "fn",
            ResourceKind::HttpEndpoint => "api",
        }
    }

    /// Synthesizes the attribute object a real provider would return.
    fn attributes_for(
        kind: ResourceKind,
        provider_id: &str,
        config: &serde_json::Value,
    ) -> serde_json::Value {
        match kind {
            ResourceKind::IdentityPool => json!({
                "id": provider_id,
                "arn": format!("arn:sim:identity:pool/{provider_id}"),
            }),
            ResourceKind::IdentityDomain => {
                let prefix = config
                    .get("domain_prefix")
                    .and_then(|v| v.as_str())
                    .unwrap_or(provider_id);
                json!({
                    "id": provider_id,
                    "base_url": format!("https://{prefix}.auth.simulated.dev"),
                })
            }
            ResourceKind::IdentityClient => {
                let mut attributes = json!({ "id": provider_id });
                let wants_secret = config
                    .get("generate_secret")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(false);
                if wants_secret {
                    attributes["client_secret"] = json!(format!("secret-{provider_id}"));
                }
                attributes
            }
            ResourceKind::ComputeFunction => json!({
                "id": provider_id,
                "arn": format!("arn:sim:function/{provider_id}"),
            }),
            ResourceKind::HttpEndpoint => json!({
                "id": provider_id,
                "url": format!("https://{provider_id}.execute.simulated.dev/prod/"),
            }),
        }
    }
}

#[async_trait]
impl ProviderApi for SimulatedProvider {
    async fn create(&self, request: CreateRequest) -> Result<CreatedResource> {
        let mut inner = self.inner.lock().await;
        if let Some(fault) = inner.fault.take() {
            return Err(fault.into());
        }
        inner.sequence += 1;
        let provider_id = format!(
            "sim-{}-{:04}",
            Self::id_prefix(request.kind),
            inner.sequence
        );

        let mut attributes = Self::attributes_for(request.kind, &provider_id, &request.config);
        if !request.tags.is_empty() {
            let tags: serde_json::Map<String, serde_json::Value> = request
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), json!(v)))
                .collect();
            attributes["tags"] = serde_json::Value::Object(tags);
        }

        inner.resources.insert(provider_id.clone(), attributes.clone());
        info!(
            "Simulated create: {} {} -> {provider_id}",
            request.kind, request.resource_id
        );

        Ok(CreatedResource {
            provider_id,
            attributes,
        })
    }

    async fn delete(&self, provider_id: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.resources.remove(provider_id).is_none() {
            return Err(ProviderError::NotFound {
                provider_id: provider_id.to_string(),
            }
            .into());
        }
        debug!("Simulated delete: {provider_id}");
        Ok(())
    }

    async fn describe(&self, provider_id: &str) -> Result<serde_json::Value> {
        let inner = self.inner.lock().await;
        inner
            .resources
            .get(provider_id)
            .cloned()
            .ok_or_else(|| {
                ProviderError::NotFound {
                    provider_id: provider_id.to_string(),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: ResourceKind, id: &str) -> CreateRequest {
        CreateRequest {
            resource_id: id.to_string(),
            kind,
            config: json!({}),
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn ids_are_deterministic_per_run() {
        let provider = SimulatedProvider::new();
        let first = provider
            .create(request(ResourceKind::IdentityPool, "pool"))
            .await
            .unwrap();
        let second = provider
            .create(request(ResourceKind::HttpEndpoint, "endpoint"))
            .await
            .unwrap();

        assert_eq!(first.provider_id, "sim-pool-0001");
        assert_eq!(second.provider_id, "sim-api-0002");
    }

    #[tokio::test]
    async fn endpoint_attributes_carry_the_assigned_url() {
        let provider = SimulatedProvider::new();
        let created = provider
            .create(request(ResourceKind::HttpEndpoint, "endpoint"))
            .await
            .unwrap();

        let url = created.attributes["url"].as_str().unwrap();
        assert!(url.starts_with("https://sim-api-"));
        assert!(url.ends_with("/prod/"));
    }

    #[tokio::test]
    async fn delete_is_not_idempotent_at_the_provider() {
        let provider = SimulatedProvider::new();
        let created = provider
            .create(request(ResourceKind::ComputeFunction, "handler"))
            .await
            .unwrap();

        provider.delete(&created.provider_id).await.unwrap();
        let err = provider.delete(&created.provider_id).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn transient_faults_are_retryable_with_a_delay() {
        let provider = SimulatedProvider::new();

        provider
            .inject_create_fault(ProviderError::Throttled {
                retry_after_secs: 30,
            })
            .await;
        let err = provider
            .create(request(ResourceKind::IdentityPool, "pool"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.retry_delay_secs(), Some(30));

        provider
            .inject_create_fault(ProviderError::network("connection reset"))
            .await;
        let err = provider
            .create(request(ResourceKind::IdentityPool, "pool"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.retry_delay_secs(), Some(5));

        // The fault is consumed; the next create succeeds.
        let created = provider
            .create(request(ResourceKind::IdentityPool, "pool"))
            .await;
        assert!(created.is_ok());
    }

    #[tokio::test]
    async fn create_failures_are_not_retryable() {
        let provider = SimulatedProvider::new();
        provider
            .inject_create_fault(ProviderError::create_failed("pool", "quota exceeded"))
            .await;

        let err = provider
            .create(request(ResourceKind::IdentityPool, "pool"))
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(err.retry_delay_secs(), None);
    }

    #[tokio::test]
    async fn describe_returns_create_attributes() {
        let provider = SimulatedProvider::new();
        let created = provider
            .create(request(ResourceKind::IdentityPool, "pool"))
            .await
            .unwrap();

        let described = provider.describe(&created.provider_id).await.unwrap();
        assert_eq!(described, created.attributes);
    }
}
