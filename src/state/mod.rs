//! Stack state persistence.
//!
//! What a deploy created is recorded here so later invocations can
//! re-apply idempotently, report status, and destroy in exact reverse
//! order.

mod local;
mod store;
mod types;

pub use local::{DEFAULT_STATE_PATH, LocalStateStore};
pub use store::StateStore;
pub use types::{RecordedResource, STATE_VERSION, StackState};
