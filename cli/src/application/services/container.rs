//! Application service: single named container with a persisted volume.
//!
//! Runs the same `docker` sequence whether the shell targets a WSL
//! distribution or the Linux host.

use anyhow::Result;

use crate::application::ports::{ProgressReporter, ShellExecutor};
use crate::application::services::distro::check_step;
use crate::domain::config::ContainerConfig;
use crate::domain::provision::{
    ContainerState, container_inspect_args, container_run_args, parse_container_state,
};

/// What `ensure_container` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerOutcome {
    AlreadyRunning,
    /// A stopped container was started again.
    Started { previous: String },
    Created,
}

/// Builds `docker` command lines, optionally behind `sudo`.
pub struct Docker<'a, S> {
    shell: &'a S,
    sudo: bool,
}

impl<'a, S: ShellExecutor> Docker<'a, S> {
    #[must_use]
    pub fn new(shell: &'a S, sudo: bool) -> Self {
        Self { shell, sudo }
    }

    async fn run(&self, args: &[String]) -> Result<std::process::Output> {
        let mut argv: Vec<&str> = Vec::with_capacity(args.len() + 2);
        if self.sudo {
            argv.push("sudo");
        }
        argv.push("docker");
        argv.extend(args.iter().map(String::as_str));
        self.shell.exec(&argv).await
    }

    /// Current state of the container named `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if `docker ps` fails.
    pub async fn state(&self, name: &str) -> Result<ContainerState> {
        let output = check_step("docker ps", self.run(&container_inspect_args(name)).await?)?;
        Ok(parse_container_state(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Make sure the configured container is running.
///
/// # Errors
///
/// Returns an error if any `docker` invocation exits non-zero.
pub async fn ensure_container(
    docker: &Docker<'_, impl ShellExecutor>,
    cfg: &ContainerConfig,
    reporter: &impl ProgressReporter,
) -> Result<ContainerOutcome> {
    match docker.state(&cfg.name).await? {
        ContainerState::Running => {
            tracing::info!(container = %cfg.name, "container already running");
            Ok(ContainerOutcome::AlreadyRunning)
        }
        ContainerState::Stopped(previous) => {
            reporter.step(&format!("starting container '{}'...", cfg.name));
            check_step(
                "docker start",
                docker.run(&["start".into(), cfg.name.clone()]).await?,
            )?;
            reporter.success(&format!("container '{}' started", cfg.name));
            Ok(ContainerOutcome::Started { previous })
        }
        ContainerState::Absent => {
            reporter.step(&format!("creating volume '{}'...", cfg.volume));
            check_step(
                "docker volume create",
                docker
                    .run(&["volume".into(), "create".into(), cfg.volume.clone()])
                    .await?,
            )?;
            reporter.step(&format!("launching container '{}' ({})...", cfg.name, cfg.image));
            check_step("docker run", docker.run(&container_run_args(cfg)).await?)?;
            reporter.success(&format!("container '{}' running", cfg.name));
            Ok(ContainerOutcome::Created)
        }
    }
}
