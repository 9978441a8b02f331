//! Infrastructure implementation of the `ProvisionStateStore` port.
//!
//! `StateManager` provides async load/save using `tokio::task::spawn_blocking`
//! with atomic write (temp file + rename) so an interrupted save never leaves
//! a truncated record.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::ProvisionStateStore;
use crate::domain::provision::ProvisionRecord;

/// State file manager implementing `ProvisionStateStore` for the infra layer.
pub struct StateManager {
    path: PathBuf,
}

impl StateManager {
    /// Create a state manager using the default path (`~/.wslstack/state.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::with_path(home.join(".wslstack").join("state.json")))
    }

    /// Create a state manager with an explicit path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    fn load_sync(&self) -> Result<Option<ProvisionRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading state file {}", self.path.display()))?;
        let record: ProvisionRecord = serde_json::from_str(&content)
            .with_context(|| format!("parsing state file {}", self.path.display()))?;
        Ok(Some(record))
    }

    fn save_sync(&self, record: &ProvisionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(record).context("serializing state")?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("finalizing state file {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "provisioning record saved");
        Ok(())
    }
}

impl ProvisionStateStore for StateManager {
    async fn load_async(&self) -> Result<Option<ProvisionRecord>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || StateManager::with_path(path).load_sync())
            .await
            .context("state load task panicked")?
    }

    async fn save_async(&self, record: &ProvisionRecord) -> Result<()> {
        let path = self.path.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || StateManager::with_path(path).save_sync(&record))
            .await
            .context("state save task panicked")?
    }
}
