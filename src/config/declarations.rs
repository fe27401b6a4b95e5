//! Lowering a typed stack configuration into resource declarations.
//!
//! The typed config knows nothing about references; this is where the
//! cross-resource wiring is declared: the domain and client point at
//! the pool, the endpoint at the function, and the client's callback
//! URL at the endpoint's post-creation address.

use serde_json::json;

use super::spec::{CallbackStrategy, StackConfig};
use crate::model::{ConfigValue, Resource, ResourceKind, TagSet};

/// Logical id of the identity pool.
pub const POOL_ID: &str = "pool";
/// Logical id of the hosted domain.
pub const DOMAIN_ID: &str = "domain";
/// Logical id of the compute function.
pub const FUNCTION_ID: &str = "function";
/// Logical id of the HTTP endpoint.
pub const ENDPOINT_ID: &str = "endpoint";
/// Logical id of the application client.
pub const CLIENT_ID: &str = "client";

/// Lowers a stack configuration into declarations plus the tag set.
///
/// Declaration order is pool, domain, function, endpoint, client —
/// this order is the tie-break for the creation order, so it is part
/// of the deployment's observable behavior.
#[must_use]
pub fn declare_stack(config: &StackConfig) -> (Vec<Resource>, TagSet) {
    let resources = vec![
        declare_pool(config),
        declare_domain(config),
        declare_function(config),
        declare_endpoint(config),
        declare_client(config),
    ];

    let tags = TagSet::from_pairs(
        config
            .tags
            .iter()
            .map(|t| (t.key.clone(), t.value.clone()))
            .collect(),
    );

    (resources, tags)
}

fn declare_pool(config: &StackConfig) -> Resource {
    let pool = &config.identity_pool;
    let policy = &pool.password_policy;

    let aliases = pool
        .sign_in_aliases
        .iter()
        .map(|alias| ConfigValue::Literal(json!(alias)))
        .collect();

    Resource::new(POOL_ID, ResourceKind::IdentityPool)
        .with_field("name", ConfigValue::literal(config.project.name.as_str()))
        .with_field(
            "self_sign_up_enabled",
            ConfigValue::literal(pool.self_sign_up_enabled),
        )
        .with_field("sign_in_aliases", ConfigValue::List(aliases))
        .with_field("mfa", ConfigValue::Literal(json!(pool.mfa)))
        .with_field(
            "account_recovery",
            ConfigValue::Literal(json!(pool.account_recovery)),
        )
        .with_field("password_min_length", ConfigValue::literal(policy.min_length))
        .with_field(
            "password_require_lowercase",
            ConfigValue::literal(policy.require_lowercase),
        )
        .with_field(
            "password_require_uppercase",
            ConfigValue::literal(policy.require_uppercase),
        )
        .with_field(
            "password_require_digits",
            ConfigValue::literal(policy.require_digits),
        )
        .with_field(
            "password_require_symbols",
            ConfigValue::literal(policy.require_symbols),
        )
        .with_field(
            "temp_password_validity_days",
            ConfigValue::literal(policy.temp_password_validity_days),
        )
}

fn declare_domain(config: &StackConfig) -> Resource {
    Resource::new(DOMAIN_ID, ResourceKind::IdentityDomain)
        .with_field("user_pool_id", ConfigValue::reference(POOL_ID, "id"))
        .with_field(
            "domain_prefix",
            ConfigValue::literal(config.identity_domain.prefix.as_str()),
        )
}

fn declare_function(config: &StackConfig) -> Resource {
    let function = &config.compute_function;
    Resource::new(FUNCTION_ID, ResourceKind::ComputeFunction)
        .with_field("name", ConfigValue::literal(function.name.as_str()))
        .with_field("runtime", ConfigValue::literal(function.runtime.as_str()))
        .with_field("handler", ConfigValue::literal(function.handler.as_str()))
        .with_field("code_path", ConfigValue::literal(function.code_path.as_str()))
}

fn declare_endpoint(config: &StackConfig) -> Resource {
    let endpoint = &config.http_endpoint;
    Resource::new(ENDPOINT_ID, ResourceKind::HttpEndpoint)
        .with_field("name", ConfigValue::literal(endpoint.name.as_str()))
        .with_field("method", ConfigValue::literal(endpoint.method.as_str()))
        .with_field("function_id", ConfigValue::reference(FUNCTION_ID, "id"))
}

fn declare_client(config: &StackConfig) -> Resource {
    let client = &config.identity_client;

    let auth_flows = client
        .auth_flows
        .iter()
        .map(|flow| ConfigValue::Literal(json!(flow)))
        .collect();

    let mut resource = Resource::new(CLIENT_ID, ResourceKind::IdentityClient)
        .with_field("client_name", ConfigValue::literal(client.name.as_str()))
        .with_field("user_pool_id", ConfigValue::reference(POOL_ID, "id"))
        .with_field("generate_secret", ConfigValue::literal(client.generate_secret))
        .with_field(
            "access_token_validity_minutes",
            ConfigValue::literal(client.access_token_validity_minutes),
        )
        .with_field(
            "id_token_validity_minutes",
            ConfigValue::literal(client.id_token_validity_minutes),
        )
        .with_field(
            "refresh_token_validity_days",
            ConfigValue::literal(client.refresh_token_validity_days),
        )
        .with_field(
            "auth_session_validity_minutes",
            ConfigValue::literal(client.auth_session_validity_minutes),
        )
        .with_field(
            "enable_token_revocation",
            ConfigValue::literal(client.enable_token_revocation),
        )
        .with_field(
            "prevent_user_existence_errors",
            ConfigValue::literal(client.prevent_user_existence_errors),
        )
        .with_field("auth_flows", ConfigValue::List(auth_flows));

    if let Some(oauth) = &client.oauth {
        let flows = oauth
            .flows
            .iter()
            .map(|flow| ConfigValue::Literal(json!(flow)))
            .collect();
        let scopes = oauth
            .scopes
            .iter()
            .map(|scope| ConfigValue::Literal(json!(scope)))
            .collect();

        // The endpoint's address is unknown until it is created; the
        // callback is a reference resolved at provisioning time.
        let callback = match oauth.callback_strategy {
            CallbackStrategy::Wildcard => ConfigValue::Concat(vec![
                ConfigValue::reference(ENDPOINT_ID, "url"),
                ConfigValue::literal("*"),
            ]),
            CallbackStrategy::Exact => ConfigValue::reference(ENDPOINT_ID, "url"),
        };

        resource = resource
            .with_field("oauth_flows", ConfigValue::List(flows))
            .with_field("oauth_scopes", ConfigValue::List(scopes))
            .with_field("callback_urls", ConfigValue::List(vec![callback]));
    }

    resource
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parser::ConfigParser;
    use crate::graph::DependencyGraph;
    use crate::model::SchemaValidator;

    const STACK_YAML: &str = r#"
project:
  name: demo-auth

tags:
  - key: Environment
    value: development

identity_pool:
  self_sign_up_enabled: true
  sign_in_aliases: [email]

identity_domain:
  prefix: drewmcgrath

compute_function:
  name: hello-handler
  runtime: python3.9
  handler: hello.hello_handler
  code_path: lambda

http_endpoint:
  name: auth-endpoint

identity_client:
  name: auth-client
  generate_secret: true
  oauth:
    flows: [authorization_code]
    scopes: [email, openid]
"#;

    fn parsed() -> StackConfig {
        ConfigParser::new().parse_str(STACK_YAML).unwrap()
    }

    #[test]
    fn lowered_stack_passes_schema_validation() {
        let (resources, _) = declare_stack(&parsed());
        assert_eq!(resources.len(), 5);
        SchemaValidator::new().validate(&resources).unwrap();
    }

    #[test]
    fn lowered_stack_orders_as_expected() {
        let (resources, _) = declare_stack(&parsed());
        let order = DependencyGraph::new().build(&resources).unwrap();
        assert_eq!(order, vec!["pool", "domain", "function", "endpoint", "client"]);
    }

    #[test]
    fn client_references_pool_and_endpoint() {
        let (resources, _) = declare_stack(&parsed());
        let client = resources.iter().find(|r| r.id == CLIENT_ID).unwrap();

        let targets: Vec<&str> = client
            .references()
            .iter()
            .map(|r| r.target_id.as_str())
            .collect();
        assert!(targets.contains(&POOL_ID));
        assert!(targets.contains(&ENDPOINT_ID));
    }

    #[test]
    fn wildcard_strategy_wraps_the_endpoint_reference() {
        let (resources, _) = declare_stack(&parsed());
        let client = resources.iter().find(|r| r.id == CLIENT_ID).unwrap();

        let Some(ConfigValue::List(urls)) = client.field("callback_urls") else {
            panic!("callback_urls missing");
        };
        assert!(matches!(urls[0], ConfigValue::Concat(_)));
    }

    #[test]
    fn exact_strategy_uses_a_plain_reference() {
        let mut config = parsed();
        config.identity_client.oauth.as_mut().unwrap().callback_strategy =
            CallbackStrategy::Exact;

        let (resources, _) = declare_stack(&config);
        let client = resources.iter().find(|r| r.id == CLIENT_ID).unwrap();

        let Some(ConfigValue::List(urls)) = client.field("callback_urls") else {
            panic!("callback_urls missing");
        };
        assert!(matches!(urls[0], ConfigValue::Reference(_)));
    }

    #[test]
    fn tags_preserve_declaration_order() {
        let (_, tags) = declare_stack(&parsed());
        assert_eq!(tags.pairs(), &[(
            String::from("Environment"),
            String::from("development"),
        )]);
    }
}
