//! Stack configuration: parsing, typed spec, and lowering.

mod declarations;
mod parser;
mod spec;

pub use declarations::{
    CLIENT_ID, DOMAIN_ID, ENDPOINT_ID, FUNCTION_ID, POOL_ID, declare_stack,
};
pub use parser::{ConfigParser, DEFAULT_CONFIG_NAME, find_config_file};
pub use spec::{
    AccountRecovery, AuthFlow, CallbackStrategy, ComputeFunctionConfig, HttpEndpointConfig,
    IdentityClientConfig, IdentityDomainConfig, IdentityPoolConfig, MfaMode, OauthConfig,
    OauthFlow, PasswordPolicyConfig, ProjectConfig, SignInAlias, StackConfig, TagConfig,
};
