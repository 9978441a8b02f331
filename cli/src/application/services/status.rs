//! Application service: provisioning status.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;
use serde::Serialize;

use crate::application::ports::{DistroManager, ProvisionStateStore, ShellExecutor};
use crate::application::services::container::Docker;
use crate::domain::provision::{ContainerState, ProvisionRecord};

/// Everything `wslstack status` reports.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub distro: String,
    /// `None` when `wsl.exe` could not be queried.
    pub imported: Option<bool>,
    pub container_name: String,
    /// `None` when the distribution is not imported or Docker did not answer.
    pub container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ProvisionRecord>,
}

/// Gather status without changing anything.
///
/// # Errors
///
/// Returns an error if the state file exists but cannot be read.
pub async fn gather_status(
    distros: &impl DistroManager,
    shell: &impl ShellExecutor,
    state: &impl ProvisionStateStore,
    distro: &str,
    container_name: &str,
) -> Result<StatusReport> {
    let record = state.load_async().await?;

    let imported = match distros.list().await {
        Ok(list) => Some(list.iter().any(|d| d.eq_ignore_ascii_case(distro))),
        Err(e) => {
            tracing::debug!(error = %e, "cannot list WSL distributions");
            None
        }
    };

    let container = if imported == Some(true) {
        match Docker::new(shell, false).state(container_name).await {
            Ok(ContainerState::Absent) => Some("absent".to_string()),
            Ok(ContainerState::Running) => Some("running".to_string()),
            Ok(ContainerState::Stopped(s)) => Some(s),
            Err(e) => {
                tracing::debug!(error = %e, "cannot query container state");
                None
            }
        }
    } else {
        None
    };

    Ok(StatusReport {
        distro: distro.to_string(),
        imported,
        container_name: container_name.to_string(),
        container,
        record,
    })
}
