// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![cfg_attr(not(test), deny(missing_docs))] // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Stackpilot
//!
//! A declarative, idempotent provisioning engine for authentication stacks.
//!
//! ## Overview
//!
//! Stackpilot takes a YAML stack file describing an identity pool, a hosted
//! identity domain, a compute function, an HTTP endpoint, and an OAuth client,
//! and provisions them in dependency order:
//!
//! - Declare your stack as data, not as imperative provisioning steps
//! - Resources reference each other's attributes lazily; values resolve only
//!   after the referenced resource has been created
//! - Re-running a deploy skips everything already created
//! - Teardown walks the exact reverse of creation order
//!
//! ## Architecture
//!
//! A deployment runs in three phases:
//!
//! 1. **Validation**: every declaration is schema-checked; all violations are
//!    collected and reported together
//! 2. **Ordering**: references induce a dependency graph; a deterministic
//!    topological sort fixes the creation order, with declaration order
//!    breaking ties
//! 3. **Provisioning**: resources are created one at a time, with references
//!    resolved against already-created resources just before each create call
//!
//! ## Modules
//!
//! - [`model`]: resource declarations, config values, references, tags
//! - [`graph`]: dependency extraction and deterministic ordering
//! - [`resolver`]: lazy reference resolution against run-time state
//! - [`provider`]: the provisioning backend trait and the simulated backend
//! - [`planner`]: the provisioning engine and deployment plan
//! - [`state`]: persisted deployment state (local file backend)
//! - [`config`]: YAML stack file parsing and lowering into declarations
//! - [`cli`]: command-line interface
//!
//! ## Example
//!
//! ```yaml
//! project:
//!   name: auth-stack
//!   environment: development
//!
//! identity_pool:
//!   self_sign_up_enabled: true
//!   sign_in_aliases: [email]
//!   password_policy:
//!     min_length: 12
//!
//! identity_domain:
//!   prefix: drewmcgrath
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod planner;
pub mod provider;
pub mod resolver;
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, StackConfig, declare_stack};
pub use error::{Result, StackError};
pub use graph::DependencyGraph;
pub use model::{ConfigValue, Reference, Resource, ResourceKind, ResourceState, SchemaValidator, TagSet};
pub use planner::{CancelFlag, DeploymentPlan, DeploymentReport, ProvisioningEngine};
pub use provider::{ProviderApi, SimulatedProvider};
pub use resolver::{ReferenceResolver, ResourceStateStore};
pub use state::{LocalStateStore, StackState, StateStore};
