//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::application::services::container::ContainerOutcome;
use crate::application::services::distro::ImportOutcome;
use crate::application::services::provision::ProvisionOutcome;
use crate::application::services::status::StatusReport;
use crate::domain::config::StackConfig;
use crate::domain::release::ResolvedArtifact;
use crate::infra::config::CONFIG_ENV;
use crate::output::OutputContext;

/// Renders results as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version.
    pub fn render_version(&self, version: &str) {
        if !self.ctx.quiet {
            println!("wslstack {version}");
        }
    }

    /// Render a resolved artifact.
    pub fn render_artifact(&self, artifact: &ResolvedArtifact) {
        self.ctx.success(&format!(
            "Ubuntu {} ({}) is available",
            artifact.version, artifact.codename
        ));
        self.ctx.kv("Released:", &artifact.release_date.to_string());
        self.ctx.kv("Root filesystem:", &artifact.rootfs_uri);
    }

    /// Render the summary of a WSL provisioning run.
    pub fn render_provision(&self, distro: &str, outcome: &ProvisionOutcome) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.success(&format!(
            "Distribution '{distro}' ready (Ubuntu {} {})",
            outcome.artifact.version, outcome.artifact.codename
        ));
        self.ctx.kv("Tarball:", &outcome.cache.tarball.display().to_string());
        self.ctx.kv("Import:", import_outcome_display(outcome.import));
        self.ctx.kv("systemd:", changed_display(outcome.systemd_enabled));
        self.ctx
            .kv("Container runtime:", changed_display(outcome.runtime_installed));
        if let Some(container) = &outcome.container {
            self.ctx.kv("Container:", &container_outcome_display(container));
        }
        self.ctx.kv("Shell", &format!("wsl.exe -d {distro}"));
        self.ctx.kv("Status", "wslstack status");
    }

    /// Render the result of `wslstack host`.
    pub fn render_host(&self, container: &str, outcome: &ContainerOutcome) {
        self.ctx.success(&format!(
            "Container '{container}' {}",
            container_outcome_display(outcome)
        ));
    }

    /// Render provisioning status.
    pub fn render_status(&self, report: &StatusReport) {
        if self.ctx.quiet {
            return;
        }
        let imported = match report.imported {
            Some(true) => "imported",
            Some(false) => "not imported",
            None => "unknown (wsl.exe not available)",
        };
        self.ctx
            .kv("Distribution:", &format!("{} ({imported})", report.distro));
        self.ctx.kv(
            "Container:",
            &format!(
                "{} ({})",
                report.container_name,
                report.container.as_deref().unwrap_or("unknown")
            ),
        );
        match &report.record {
            Some(record) => {
                self.ctx.kv(
                    "Release:",
                    &format!("{} ({})", record.artifact.version, record.artifact.codename),
                );
                self.ctx.kv("Root filesystem:", &record.artifact.rootfs_uri);
                if let Some(sha) = &record.tarball_sha256 {
                    self.ctx.kv("Tarball SHA-256:", sha);
                }
                self.ctx.kv(
                    "Provisioned:",
                    &record.provisioned_at.format("%Y-%m-%d %H:%M UTC").to_string(),
                );
            }
            None => self.ctx.info("Not provisioned yet. Run: wslstack provision"),
        }
    }

    /// Render the current configuration.
    pub fn render_config(&self, config: &StackConfig, path: &std::path::Path) {
        let styles = &self.ctx.styles;
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(styles.header)
        );
        println!();
        println!("  {:<20} {}", "distro.name:", config.distro.name);
        println!("  {:<20} {}", "distro.wsl_version:", config.distro.wsl_version);
        println!("  {:<20} {}", "mirror.arch:", config.mirror.arch);
        println!("  {:<20} {}", "container.name:", config.container.name);
        println!("  {:<20} {}", "container.image:", config.container.image);
        println!("  {:<20} {}", "container.volume:", config.container.volume);
        println!("  {:<20} {}", "container.mount:", config.container.mount);
        println!("  {:<20} {}", "host.sudo:", config.host.sudo);
        println!();
        println!("  {}", "Releases:".style(styles.bold));
        for release in &config.releases {
            println!("    {:<18} {}", release.label(), release.release_date);
        }
        println!();
        println!("  {}", "Environment:".style(styles.bold));
        for var in [CONFIG_ENV, "WSLSTACK_LOG", "NO_COLOR"] {
            println!(
                "    {:<18} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }

    pub fn render_config_set(&self, key: &str, value: &str) {
        self.ctx.success(&format!("Set {key} = {value}"));
    }

    /// Bare path, so the output can be used in scripts.
    pub fn render_config_path(&self, path: &std::path::Path) {
        println!("{}", path.display());
    }
}

// ── Display helpers (shared with the JSON renderer) ──────────────────────────

#[must_use]
pub fn import_outcome_display(outcome: ImportOutcome) -> &'static str {
    match outcome {
        ImportOutcome::AlreadyImported => "already imported",
        ImportOutcome::Imported => "imported",
        ImportOutcome::Replaced => "replaced",
    }
}

#[must_use]
pub fn container_outcome_display(outcome: &ContainerOutcome) -> String {
    match outcome {
        ContainerOutcome::AlreadyRunning => "already running".to_string(),
        ContainerOutcome::Started { previous } => format!("started (was {previous})"),
        ContainerOutcome::Created => "created".to_string(),
    }
}

fn changed_display(changed: bool) -> &'static str {
    if changed { "configured" } else { "already configured" }
}
