//! JSON output.
//!
//! `JsonRenderer` prints one pretty-printed object per command on stdout.
//! `format_error` builds the error object printed by `main` when a command
//! fails in `--json` mode.

use anyhow::{Context, Result};
use serde_json::json;

use crate::application::services::container::ContainerOutcome;
use crate::application::services::provision::ProvisionOutcome;
use crate::application::services::status::StatusReport;
use crate::domain::config::StackConfig;
use crate::domain::release::ResolvedArtifact;
use crate::output::human::{container_outcome_display, import_outcome_display};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Machine-readable renderer used with `--json`.
pub struct JsonRenderer;

impl JsonRenderer {
    fn print(value: &serde_json::Value) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("JSON serialization failed")?
        );
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_artifact(artifact: &ResolvedArtifact) -> Result<()> {
        Self::print(&json!({ "artifact": artifact }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_provision(distro: &str, outcome: &ProvisionOutcome) -> Result<()> {
        Self::print(&json!({
            "distro": distro,
            "artifact": outcome.artifact,
            "archive": outcome.cache.archive.display().to_string(),
            "tarball": outcome.cache.tarball.display().to_string(),
            "downloaded": outcome.cache.downloaded,
            "decompressed": outcome.cache.expanded,
            "import": import_outcome_display(outcome.import),
            "systemd_enabled": outcome.systemd_enabled,
            "runtime_installed": outcome.runtime_installed,
            "container": outcome.container.as_ref().map(container_outcome_display),
        }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_host(container: &str, outcome: &ContainerOutcome) -> Result<()> {
        Self::print(&json!({
            "container": container,
            "outcome": container_outcome_display(outcome),
        }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_status(report: &StatusReport) -> Result<()> {
        Self::print(&serde_json::to_value(report).context("JSON serialization failed")?)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_config(config: &StackConfig, path: &std::path::Path) -> Result<()> {
        Self::print(&json!({ "path": path.display().to_string(), "config": config }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_config_path(path: &std::path::Path) -> Result<()> {
        Self::print(&json!({ "path": path.display().to_string() }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_version(version: &str) -> Result<()> {
        Self::print(&json!({ "version": version }))
    }
}
