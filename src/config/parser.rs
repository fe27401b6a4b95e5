//! Stack file loading and parsing.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::StackConfig;
use crate::error::{ConfigError, Result};

/// Default stack file name, searched in the working directory.
pub const DEFAULT_CONFIG_NAME: &str = "stackpilot.stack.yaml";

/// Parser for stack configuration files.
#[derive(Debug, Default)]
pub struct ConfigParser;

impl ConfigParser {
    /// Creates a new parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parses a stack file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if the path does not
    /// exist, or [`ConfigError::ParseError`] on malformed YAML.
    pub fn parse_file(&self, path: &Path) -> Result<StackConfig> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        info!("Loading stack file: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        self.parse_str(&content)
    }

    /// Parses a stack configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] on malformed YAML.
    pub fn parse_str(&self, content: &str) -> Result<StackConfig> {
        let config: StackConfig =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
                location: e.location().map(|l| format!("line {}, column {}", l.line(), l.column())),
            })?;

        debug!(
            "Parsed stack '{}' ({})",
            config.project.name, config.project.environment
        );
        Ok(config)
    }
}

/// Finds the stack file: an explicit path if given, otherwise the
/// default name in the working directory.
///
/// # Errors
///
/// Returns [`ConfigError::FileNotFound`] if nothing is found.
pub fn find_config_file(explicit: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.clone());
    }

    let default = PathBuf::from(DEFAULT_CONFIG_NAME);
    if default.exists() {
        Ok(default)
    } else {
        Err(ConfigError::FileNotFound { path: default }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::spec::{CallbackStrategy, MfaMode, OauthFlow, SignInAlias};
    use std::io::Write;

    const STACK_YAML: &str = r#"
project:
  name: demo-auth
  environment: development

tags:
  - key: Environment
    value: development
  - key: CleanUp
    value: "true"

identity_pool:
  self_sign_up_enabled: true
  sign_in_aliases: [email]
  password_policy:
    min_length: 12
    temp_password_validity_days: 3

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
  auth_flows: [user_password, user_srp, admin_user_password, custom]
  oauth:
    flows: [authorization_code]
    scopes: [email, openid]
    callback_strategy: wildcard
"#;

    #[test]
    fn parses_a_full_stack_file() {
        let config = ConfigParser::new().parse_str(STACK_YAML).unwrap();

        assert_eq!(config.project.name, "demo-auth");
        assert_eq!(config.tags.len(), 2);
        assert_eq!(config.tags[0].key, "Environment");
        assert_eq!(config.identity_pool.sign_in_aliases, vec![SignInAlias::Email]);
        assert_eq!(config.identity_pool.mfa, MfaMode::Off);
        assert_eq!(config.identity_domain.prefix, "drewmcgrath");
        assert_eq!(config.compute_function.handler, "hello.hello_handler");
        assert_eq!(config.http_endpoint.method, "GET");

        let oauth = config.identity_client.oauth.as_ref().unwrap();
        assert_eq!(oauth.flows, vec![OauthFlow::AuthorizationCode]);
        assert_eq!(oauth.callback_strategy, CallbackStrategy::Wildcard);
    }

    #[test]
    fn defaults_fill_omitted_client_fields() {
        let config = ConfigParser::new().parse_str(STACK_YAML).unwrap();
        let client = &config.identity_client;

        assert_eq!(client.access_token_validity_minutes, 60);
        assert_eq!(client.id_token_validity_minutes, 60);
        assert_eq!(client.refresh_token_validity_days, 30);
        assert_eq!(client.auth_session_validity_minutes, 3);
        assert!(client.enable_token_revocation);
        assert!(client.prevent_user_existence_errors);
    }

    #[test]
    fn malformed_yaml_reports_a_parse_error() {
        let err = ConfigParser::new().parse_str("project: [").unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn parse_file_round_trips_through_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(STACK_YAML.as_bytes()).unwrap();

        let config = ConfigParser::new().parse_file(file.path()).unwrap();
        assert_eq!(config.project.name, "demo-auth");
    }

    #[test]
    fn shipped_template_parses_validates_and_orders() {
        // The init scaffold must always produce a deployable stack.
        let template = include_str!("../../templates/stackpilot.stack.yaml");
        let config = ConfigParser::new().parse_str(template).unwrap();

        let (resources, tags) = crate::config::declare_stack(&config);
        crate::model::SchemaValidator::new().validate(&resources).unwrap();

        let order = crate::graph::DependencyGraph::new().build(&resources).unwrap();
        assert_eq!(order, vec!["pool", "domain", "function", "endpoint", "client"]);
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = ConfigParser::new()
            .parse_file(Path::new("/nonexistent/stack.yaml"))
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
