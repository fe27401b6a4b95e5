//! Static schema validation for resource declarations.
//!
//! Every declared resource's config is checked against the static
//! schema for its kind before any provider call is made. All
//! violations are collected and reported together so the caller can
//! fix the whole declaration set in one pass. No side effects.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::error::{Result, SchemaError, SchemaViolation};
use crate::model::resource::{ConfigValue, Resource, ResourceKind};

/// Minimum accepted password length for an identity pool policy.
pub const MIN_PASSWORD_LENGTH: u64 = 8;

/// Validator for resource declarations.
#[derive(Debug, Default)]
pub struct SchemaValidator;

/// Fields whose reference target must be a specific resource kind.
const KIND_CHECKED_FIELDS: &[(&str, ResourceKind)] = &[
    ("user_pool_id", ResourceKind::IdentityPool),
    ("function_id", ResourceKind::ComputeFunction),
];

impl SchemaValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a set of resource declarations.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] listing every violation found.
    pub fn validate(&self, resources: &[Resource]) -> Result<()> {
        let mut violations = Vec::new();

        Self::validate_ids(resources, &mut violations);
        Self::validate_references(resources, &mut violations);

        for resource in resources {
            match resource.kind {
                ResourceKind::IdentityPool => Self::validate_pool(resource, &mut violations),
                ResourceKind::IdentityDomain => Self::validate_domain(resource, &mut violations),
                ResourceKind::IdentityClient => Self::validate_client(resource, &mut violations),
                ResourceKind::ComputeFunction => {
                    Self::validate_function(resource, &mut violations);
                }
                ResourceKind::HttpEndpoint => Self::validate_endpoint(resource, &mut violations),
            }
        }

        if violations.is_empty() {
            debug!("Schema validation passed for {} resources", resources.len());
            Ok(())
        } else {
            Err(SchemaError::new(violations).into())
        }
    }

    /// Validates id uniqueness and naming convention.
    fn validate_ids(resources: &[Resource], violations: &mut Vec<SchemaViolation>) {
        let mut seen = HashSet::new();

        for resource in resources {
            if !seen.insert(resource.id.as_str()) {
                violations.push(SchemaViolation::new(
                    &resource.id,
                    "id",
                    format!("Duplicate resource id: {}", resource.id),
                ));
            }

            if !is_valid_name(&resource.id) {
                violations.push(SchemaViolation::new(
                    &resource.id,
                    "id",
                    format!(
                        "Resource id '{}' is invalid. Must be lowercase alphanumeric with hyphens.",
                        resource.id
                    ),
                ));
            }
        }
    }

    /// Validates that every reference targets a declared resource of
    /// the expected kind.
    fn validate_references(resources: &[Resource], violations: &mut Vec<SchemaViolation>) {
        let kinds: HashMap<&str, ResourceKind> = resources
            .iter()
            .map(|r| (r.id.as_str(), r.kind))
            .collect();

        for resource in resources {
            for (field, value) in &resource.config {
                let mut refs = Vec::new();
                value.collect_references(&mut refs);

                for reference in refs {
                    let Some(target_kind) = kinds.get(reference.target_id.as_str()) else {
                        violations.push(SchemaViolation::new(
                            &resource.id,
                            field,
                            format!("Reference to undeclared resource '{}'", reference.target_id),
                        ));
                        continue;
                    };

                    if reference.target_id == resource.id {
                        violations.push(SchemaViolation::new(
                            &resource.id,
                            field,
                            "Resource references itself",
                        ));
                    }

                    for (checked_field, expected_kind) in KIND_CHECKED_FIELDS {
                        if field == checked_field && target_kind != expected_kind {
                            violations.push(SchemaViolation::new(
                                &resource.id,
                                field,
                                format!(
                                    "Field '{field}' must reference a {expected_kind}, \
                                     but '{}' is a {target_kind}",
                                    reference.target_id
                                ),
                            ));
                        }
                    }
                }
            }
        }
    }

    /// Validates an identity pool declaration.
    fn validate_pool(resource: &Resource, violations: &mut Vec<SchemaViolation>) {
        if let Some(min_length) = resource.field("password_min_length") {
            match min_length.as_u64() {
                Some(length) if length >= MIN_PASSWORD_LENGTH => {}
                Some(length) => violations.push(SchemaViolation::new(
                    &resource.id,
                    "password_min_length",
                    format!(
                        "Password minimum length {length} is below the floor of \
                         {MIN_PASSWORD_LENGTH}"
                    ),
                )),
                None => violations.push(SchemaViolation::new(
                    &resource.id,
                    "password_min_length",
                    "Password minimum length must be a positive integer",
                )),
            }
        }

        Self::check_positive(resource, "temp_password_validity_days", violations);
    }

    /// Validates an identity domain declaration.
    fn validate_domain(resource: &Resource, violations: &mut Vec<SchemaViolation>) {
        Self::require_field(resource, "user_pool_id", violations);

        match resource.field("domain_prefix") {
            Some(prefix) => {
                if !prefix.as_str().is_some_and(is_valid_name) {
                    violations.push(SchemaViolation::new(
                        &resource.id,
                        "domain_prefix",
                        "Domain prefix must be lowercase alphanumeric with hyphens",
                    ));
                }
            }
            None => violations.push(SchemaViolation::new(
                &resource.id,
                "domain_prefix",
                "Missing required field",
            )),
        }
    }

    /// Validates an identity client declaration.
    fn validate_client(resource: &Resource, violations: &mut Vec<SchemaViolation>) {
        Self::require_field(resource, "user_pool_id", violations);

        for field in [
            "access_token_validity_minutes",
            "id_token_validity_minutes",
            "refresh_token_validity_days",
            "auth_session_validity_minutes",
        ] {
            Self::check_positive(resource, field, violations);
        }

        // OAuth flows without a callback are undeployable.
        let has_flows = matches!(
            resource.field("oauth_flows"),
            Some(ConfigValue::List(flows)) if !flows.is_empty()
        );
        if has_flows {
            let has_callbacks = matches!(
                resource.field("callback_urls"),
                Some(ConfigValue::List(urls)) if !urls.is_empty()
            );
            if !has_callbacks {
                violations.push(SchemaViolation::new(
                    &resource.id,
                    "callback_urls",
                    "OAuth flows are enabled but no callback URL is configured",
                ));
            }
        }
    }

    /// Validates a compute function declaration.
    fn validate_function(resource: &Resource, violations: &mut Vec<SchemaViolation>) {
        for field in ["runtime", "code_path"] {
            if resource
                .field(field)
                .and_then(ConfigValue::as_str)
                .is_none_or(str::is_empty)
            {
                violations.push(SchemaViolation::new(
                    &resource.id,
                    field,
                    "Field must be a non-empty string",
                ));
            }
        }

        match resource.field("handler").and_then(ConfigValue::as_str) {
            Some(handler) if is_valid_handler(handler) => {}
            Some(handler) => violations.push(SchemaViolation::new(
                &resource.id,
                "handler",
                format!("Handler '{handler}' must have the form 'module.function'"),
            )),
            None => violations.push(SchemaViolation::new(
                &resource.id,
                "handler",
                "Missing required field",
            )),
        }
    }

    /// Validates an HTTP endpoint declaration.
    fn validate_endpoint(resource: &Resource, violations: &mut Vec<SchemaViolation>) {
        Self::require_field(resource, "function_id", violations);
    }

    /// Records a violation if the field is absent.
    fn require_field(resource: &Resource, field: &str, violations: &mut Vec<SchemaViolation>) {
        if resource.field(field).is_none() {
            violations.push(SchemaViolation::new(
                &resource.id,
                field,
                "Missing required field",
            ));
        }
    }

    /// Records a violation if a present field is not a positive integer.
    fn check_positive(resource: &Resource, field: &str, violations: &mut Vec<SchemaViolation>) {
        if let Some(value) = resource.field(field)
            && value.as_u64().is_none_or(|v| v == 0)
        {
            violations.push(SchemaViolation::new(
                &resource.id,
                field,
                "Value must be a positive integer",
            ));
        }
    }
}

/// Validates the `module.function` handler shape: both segments must be
/// non-empty and the function segment must not itself end in a dot.
fn is_valid_handler(handler: &str) -> bool {
    handler
        .split_once('.')
        .is_some_and(|(module, function)| {
            !module.is_empty() && !function.is_empty() && !function.ends_with('.')
        })
}

/// Validates that a name follows the naming convention.
/// Names must be lowercase alphanumeric with hyphens, starting with a letter.
fn is_valid_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    let mut chars = name.chars();

    if let Some(first) = chars.next()
        && !first.is_ascii_lowercase()
    {
        return false;
    }

    for c in chars {
        if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
            return false;
        }
    }

    if name.ends_with('-') || name.contains("--") {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StackError;

    fn pool(id: &str) -> Resource {
        Resource::new(id, ResourceKind::IdentityPool)
            .with_field("password_min_length", ConfigValue::literal(12))
            .with_field("temp_password_validity_days", ConfigValue::literal(3))
    }

    fn function(id: &str) -> Resource {
        Resource::new(id, ResourceKind::ComputeFunction)
            .with_field("runtime", ConfigValue::literal("python3.9"))
            .with_field("handler", ConfigValue::literal("hello.hello_handler"))
            .with_field("code_path", ConfigValue::literal("lambda"))
    }

    #[test]
    fn valid_declarations_pass() {
        let resources = vec![
            pool("pool"),
            function("handler"),
            Resource::new("endpoint", ResourceKind::HttpEndpoint)
                .with_field("function_id", ConfigValue::reference("handler", "id")),
            Resource::new("domain", ResourceKind::IdentityDomain)
                .with_field("user_pool_id", ConfigValue::reference("pool", "id"))
                .with_field("domain_prefix", ConfigValue::literal("drewmcgrath")),
        ];

        assert!(SchemaValidator::new().validate(&resources).is_ok());
    }

    #[test]
    fn all_violations_reported_together() {
        let resources = vec![
            // Weak password policy AND zero temp validity: two violations.
            Resource::new("pool", ResourceKind::IdentityPool)
                .with_field("password_min_length", ConfigValue::literal(4))
                .with_field("temp_password_validity_days", ConfigValue::literal(0)),
            // Bad handler shape: one more.
            Resource::new("handler", ResourceKind::ComputeFunction)
                .with_field("runtime", ConfigValue::literal("python3.9"))
                .with_field("handler", ConfigValue::literal("nodots"))
                .with_field("code_path", ConfigValue::literal("lambda")),
        ];

        let err = SchemaValidator::new().validate(&resources).unwrap_err();
        let StackError::Schema(schema) = err else {
            panic!("expected schema error, got {err}");
        };
        assert_eq!(schema.violations.len(), 3);
    }

    #[test]
    fn reference_to_undeclared_resource_is_a_violation() {
        let resources = vec![
            Resource::new("endpoint", ResourceKind::HttpEndpoint)
                .with_field("function_id", ConfigValue::reference("ghost", "id")),
        ];

        let err = SchemaValidator::new().validate(&resources).unwrap_err();
        let StackError::Schema(schema) = err else {
            panic!("expected schema error, got {err}");
        };
        assert!(
            schema
                .violations
                .iter()
                .any(|v| v.message.contains("undeclared resource 'ghost'"))
        );
    }

    #[test]
    fn kind_checked_field_rejects_wrong_target_kind() {
        let resources = vec![
            function("handler"),
            Resource::new("domain", ResourceKind::IdentityDomain)
                .with_field("user_pool_id", ConfigValue::reference("handler", "id"))
                .with_field("domain_prefix", ConfigValue::literal("auth")),
        ];

        let err = SchemaValidator::new().validate(&resources).unwrap_err();
        assert!(err.to_string().contains("must reference a identity_pool"));
    }

    #[test]
    fn handler_requires_module_and_function_segments() {
        for bad in [".handler", "handler.", "nodots", ".", "module.f."] {
            let resources = vec![
                Resource::new("handler", ResourceKind::ComputeFunction)
                    .with_field("runtime", ConfigValue::literal("python3.9"))
                    .with_field("handler", ConfigValue::literal(bad))
                    .with_field("code_path", ConfigValue::literal("lambda")),
            ];

            let err = SchemaValidator::new().validate(&resources).unwrap_err();
            assert!(
                err.to_string().contains("module.function"),
                "'{bad}' was accepted"
            );
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let resources = vec![pool("pool"), pool("pool")];

        let err = SchemaValidator::new().validate(&resources).unwrap_err();
        assert!(err.to_string().contains("Duplicate resource id"));
    }

    #[test]
    fn oauth_flows_require_callbacks() {
        let resources = vec![
            pool("pool"),
            Resource::new("client", ResourceKind::IdentityClient)
                .with_field("user_pool_id", ConfigValue::reference("pool", "id"))
                .with_field(
                    "oauth_flows",
                    ConfigValue::List(vec![ConfigValue::literal("authorization_code")]),
                ),
        ];

        let err = SchemaValidator::new().validate(&resources).unwrap_err();
        assert!(err.to_string().contains("no callback URL"));
    }
}
