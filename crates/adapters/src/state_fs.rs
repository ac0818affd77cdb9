//! JSON file state store: one file per subscription resource

use async_trait::async_trait;
use fastly_tls_domain::{ResourceStateStore, StateError, SubscriptionResource};
use std::path::{Path, PathBuf};

/// Stores a single resource's state as pretty-printed JSON
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResourceStateStore for JsonFileStateStore {
    async fn load(&self) -> Result<Option<SubscriptionResource>, StateError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let resource = serde_json::from_str(&content).map_err(|e| {
            StateError::Serialization(format!("{}: {}", self.path.display(), e))
        })?;
        Ok(Some(resource))
    }

    async fn save(&self, resource: &SubscriptionResource) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(resource)
            .map_err(|e| StateError::Serialization(e.to_string()))?;

        // Written to a sibling file, then renamed into place
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), id = %resource.id, "Saved resource state");
        Ok(())
    }

    async fn remove(&self) -> Result<(), StateError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
