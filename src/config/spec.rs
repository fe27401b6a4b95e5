//! Stack configuration types.
//!
//! This module defines the structs that map to the
//! `stackpilot.stack.yaml` file: a project header, an ordered tag
//! list, and one section per resource kind. These types fully describe
//! the desired stack; lowering them into generic resource declarations
//! happens in [`declarations`](super::declarations).

use serde::{Deserialize, Serialize};

/// The root configuration structure for a stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackConfig {
    /// Project-level configuration.
    pub project: ProjectConfig,
    /// Tags applied to every resource, in declaration order.
    #[serde(default)]
    pub tags: Vec<TagConfig>,
    /// The identity pool.
    pub identity_pool: IdentityPoolConfig,
    /// The pool's hosted sign-in domain.
    pub identity_domain: IdentityDomainConfig,
    /// The compute function behind the HTTP entry point.
    pub compute_function: ComputeFunctionConfig,
    /// The HTTP entry point.
    pub http_endpoint: HttpEndpointConfig,
    /// The OAuth-capable application client.
    pub identity_client: IdentityClientConfig,
}

/// Project-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Unique name for the project.
    pub name: String,
    /// Environment (e.g., "development", "prod").
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// A single ordered tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagConfig {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// Identity pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityPoolConfig {
    /// Whether users may sign themselves up.
    #[serde(default)]
    pub self_sign_up_enabled: bool,
    /// Enabled sign-in aliases.
    #[serde(default)]
    pub sign_in_aliases: Vec<SignInAlias>,
    /// Multi-factor authentication mode.
    #[serde(default)]
    pub mfa: MfaMode,
    /// Account recovery channel.
    #[serde(default)]
    pub account_recovery: AccountRecovery,
    /// Password policy.
    #[serde(default)]
    pub password_policy: PasswordPolicyConfig,
}

/// Password policy for an identity pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasswordPolicyConfig {
    /// Minimum password length.
    #[serde(default = "default_min_length")]
    pub min_length: u64,
    /// Require a lowercase character.
    #[serde(default = "default_true")]
    pub require_lowercase: bool,
    /// Require an uppercase character.
    #[serde(default = "default_true")]
    pub require_uppercase: bool,
    /// Require a digit.
    #[serde(default = "default_true")]
    pub require_digits: bool,
    /// Require a symbol.
    #[serde(default = "default_true")]
    pub require_symbols: bool,
    /// Temporary password validity in days.
    #[serde(default = "default_temp_validity")]
    pub temp_password_validity_days: u64,
}

/// Sign-in alias options.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignInAlias {
    /// Sign in with email address.
    Email,
    /// Sign in with phone number.
    Phone,
    /// Sign in with username.
    Username,
    /// Sign in with preferred username.
    PreferredUsername,
}

/// Multi-factor authentication modes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MfaMode {
    /// MFA disabled.
    #[default]
    Off,
    /// MFA optional per user.
    Optional,
    /// MFA required.
    Required,
}

/// Account recovery channels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountRecovery {
    /// Recover via email only.
    #[default]
    EmailOnly,
    /// Recover via phone, falling back to email.
    PhoneAndEmail,
}

/// Hosted domain configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityDomainConfig {
    /// Domain prefix (lowercase alphanumeric with hyphens).
    pub prefix: String,
}

/// Compute function configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComputeFunctionConfig {
    /// Function name.
    pub name: String,
    /// Execution runtime (e.g., "python3.9").
    pub runtime: String,
    /// Handler in `module.function` form.
    pub handler: String,
    /// Directory the function code is loaded from.
    pub code_path: String,
}

/// HTTP entry point configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpEndpointConfig {
    /// Endpoint name.
    pub name: String,
    /// HTTP method routed to the function.
    #[serde(default = "default_method")]
    pub method: String,
}

/// Application client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityClientConfig {
    /// Client name.
    pub name: String,
    /// Whether the provider should generate a client secret.
    #[serde(default)]
    pub generate_secret: bool,
    /// Access token validity in minutes.
    #[serde(default = "default_token_minutes")]
    pub access_token_validity_minutes: u64,
    /// Id token validity in minutes.
    #[serde(default = "default_token_minutes")]
    pub id_token_validity_minutes: u64,
    /// Refresh token validity in days.
    #[serde(default = "default_refresh_days")]
    pub refresh_token_validity_days: u64,
    /// Auth session validity in minutes.
    #[serde(default = "default_session_minutes")]
    pub auth_session_validity_minutes: u64,
    /// Whether issued tokens can be revoked.
    #[serde(default = "default_true")]
    pub enable_token_revocation: bool,
    /// Whether user-existence errors are masked.
    #[serde(default = "default_true")]
    pub prevent_user_existence_errors: bool,
    /// Enabled authentication flows.
    #[serde(default)]
    pub auth_flows: Vec<AuthFlow>,
    /// OAuth configuration, if the client does OAuth.
    #[serde(default)]
    pub oauth: Option<OauthConfig>,
}

/// Authentication flows for a client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthFlow {
    /// Username/password auth.
    UserPassword,
    /// SRP-based auth.
    UserSrp,
    /// Admin-initiated username/password auth.
    AdminUserPassword,
    /// Custom auth flow.
    Custom,
}

/// OAuth configuration for a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OauthConfig {
    /// Enabled OAuth flows.
    pub flows: Vec<OauthFlow>,
    /// Requested scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// How the callback URL is derived from the endpoint.
    #[serde(default)]
    pub callback_strategy: CallbackStrategy,
}

/// OAuth flows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OauthFlow {
    /// Authorization code grant.
    AuthorizationCode,
    /// Implicit grant.
    Implicit,
    /// Client credentials grant.
    ClientCredentials,
}

/// Callback URL derivation strategy.
///
/// The endpoint's address is only known after creation. `Wildcard`
/// suffixes the resolved URL with `*`, so any path under the endpoint
/// is an accepted callback; `Exact` uses the resolved URL as-is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CallbackStrategy {
    /// Resolved endpoint URL plus a `*` suffix.
    #[default]
    Wildcard,
    /// Resolved endpoint URL, matched exactly.
    Exact,
}

fn default_environment() -> String {
    String::from("development")
}

fn default_method() -> String {
    String::from("GET")
}

const fn default_true() -> bool {
    true
}

const fn default_min_length() -> u64 {
    12
}

const fn default_temp_validity() -> u64 {
    3
}

const fn default_token_minutes() -> u64 {
    60
}

const fn default_refresh_days() -> u64 {
    30
}

const fn default_session_minutes() -> u64 {
    3
}

impl Default for PasswordPolicyConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            require_lowercase: true,
            require_uppercase: true,
            require_digits: true,
            require_symbols: true,
            temp_password_validity_days: default_temp_validity(),
        }
    }
}
