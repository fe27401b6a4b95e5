//! Local file-based state storage.
//!
//! State is a single JSON file. Saves go through a temporary file
//! followed by a rename, so a crash mid-write never leaves a
//! half-written state file behind.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::store::StateStore;
use super::types::{STATE_VERSION, StackState};
use crate::error::{Result, StateError};

/// Default state file path, relative to the working directory.
pub const DEFAULT_STATE_PATH: &str = ".stackpilot/state.json";

/// Local file-based state store.
#[derive(Debug, Clone)]
pub struct LocalStateStore {
    /// Path to the state file.
    path: PathBuf,
}

impl LocalStateStore {
    /// Creates a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the default path.
    #[must_use]
    pub fn default_location() -> Self {
        Self::new(DEFAULT_STATE_PATH)
    }

    /// Returns the state file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load(&self) -> Result<Option<StackState>> {
        if !self.path.exists() {
            debug!("No state file at {}", self.path.display());
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let state: StackState = serde_json::from_str(&content).map_err(|e| {
            StateError::Corrupted {
                message: format!("{} is not valid state JSON: {e}", self.path.display()),
            }
        })?;

        if state.version != STATE_VERSION {
            return Err(StateError::VersionMismatch {
                expected: STATE_VERSION.to_string(),
                found: state.version,
            }
            .into());
        }

        debug!(
            "Loaded state: {} resources from {}",
            state.resources.len(),
            self.path.display()
        );
        Ok(Some(state))
    }

    async fn save(&self, state: &StackState) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(state)
            .map_err(|e| StateError::serialization(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        info!(
            "Saved state: {} resources to {}",
            state.resources.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        if self.path.exists() {
            tokio::fs::remove_file(&self.path).await?;
            info!("Deleted state file {}", self.path.display());
        }
        Ok(())
    }

    async fn exists(&self) -> Result<bool> {
        Ok(self.path.exists())
    }

    fn backend_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceKind;
    use crate::state::types::RecordedResource;
    use serde_json::json;

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStateStore::new(dir.path().join("state.json"));

        let mut state = StackState::new("demo-auth", "development");
        state.order = vec![String::from("pool"), String::from("endpoint")];
        state.set(RecordedResource::new(
            "pool",
            ResourceKind::IdentityPool,
            "sim-pool-0001",
            json!({ "id": "sim-pool-0001" }),
        ));

        store.save(&state).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();

        assert_eq!(loaded.project, "demo-auth");
        assert_eq!(loaded.order, state.order);
        assert_eq!(loaded.get("pool").unwrap().provider_id, "sim-pool-0001");
    }

    #[tokio::test]
    async fn load_without_state_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStateStore::new(dir.path().join("state.json"));
        assert!(store.load().await.unwrap().is_none());
        assert!(!store.exists().await.unwrap());
    }

    #[tokio::test]
    async fn corrupted_state_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = LocalStateStore::new(path);
        let err = store.load().await.unwrap_err();
        assert!(err.to_string().contains("corrupted"));
    }

    #[tokio::test]
    async fn delete_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStateStore::new(dir.path().join("state.json"));

        store
            .save(&StackState::new("demo-auth", "development"))
            .await
            .unwrap();
        assert!(store.exists().await.unwrap());

        store.delete().await.unwrap();
        assert!(!store.exists().await.unwrap());
    }
}
