//! Resource model: typed resource declarations and schema validation.
//!
//! Declarations are pure data; validation has no side effects and runs
//! before any provider call.

mod resource;
mod schema;

pub use resource::{ConfigValue, Reference, Resource, ResourceKind, ResourceState, TagSet};
pub use schema::{MIN_PASSWORD_LENGTH, SchemaValidator};
