//! Application service: WSL distribution setup.
//!
//! Imports the tarball as a distribution, boots it with systemd, and installs
//! the Docker engine with `apt-get`. Every step is skipped when its effect is
//! already in place.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::process::Output;

use anyhow::Result;

use crate::application::ports::{
    DistroManager, ImportSpec, LocalFs, ProgressReporter, ShellExecutor,
};
use crate::domain::error::ProvisionError;
use crate::domain::provision::{enable_systemd_in_wsl_conf, wsl_conf_enables_systemd};

/// Commands run inside the distribution to install the container runtime.
pub const DOCKER_INSTALL_STEPS: &[(&str, &[&str])] = &[
    ("apt-get update", &["env", "DEBIAN_FRONTEND=noninteractive", "apt-get", "update"]),
    (
        "apt-get install docker.io",
        &[
            "env",
            "DEBIAN_FRONTEND=noninteractive",
            "apt-get",
            "install",
            "-y",
            "docker.io",
        ],
    ),
    ("systemctl enable docker", &["systemctl", "enable", "--now", "docker"]),
];

/// What `ensure_imported` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    AlreadyImported,
    Imported,
    /// An existing distribution was unregistered and imported again.
    Replaced,
}

/// Turn a non-zero exit status into [`ProvisionError::StepFailed`].
///
/// # Errors
///
/// Returns an error if `output` did not exit successfully.
pub fn check_step(step: &str, output: Output) -> Result<Output> {
    if output.status.success() {
        return Ok(output);
    }
    Err(ProvisionError::StepFailed {
        step: step.to_string(),
        code: output.status.code().unwrap_or(-1),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
    .into())
}

/// Returns `true` if `name` is among `registered`, ignoring ASCII case as
/// `wsl.exe` does.
#[must_use]
pub fn is_registered(registered: &[String], name: &str) -> bool {
    registered.iter().any(|d| d.eq_ignore_ascii_case(name))
}

/// Import the distribution unless one with the same name is in `registered`,
/// the names `wsl --list` reported before the run started.
///
/// With `replace`, an existing distribution is unregistered first. The caller
/// is responsible for confirming that with the user.
///
/// # Errors
///
/// Returns an error if unregistering or importing fails.
pub async fn ensure_imported(
    distros: &impl DistroManager,
    fs: &impl LocalFs,
    spec: &ImportSpec<'_>,
    registered: &[String],
    replace: bool,
    reporter: &impl ProgressReporter,
) -> Result<ImportOutcome> {
    let present = is_registered(registered, spec.name);

    if present && !replace {
        tracing::info!(distro = spec.name, "distribution already imported");
        return Ok(ImportOutcome::AlreadyImported);
    }
    if present {
        reporter.step(&format!("unregistering existing distribution '{}'...", spec.name));
        check_step("wsl --unregister", distros.unregister(spec.name).await?)?;
    }

    fs.create_dir_all(spec.install_dir)?;
    reporter.step(&format!("importing distribution '{}'...", spec.name));
    check_step("wsl --import", distros.import(spec).await?)?;
    reporter.success(&format!("distribution '{}' imported", spec.name));

    Ok(if present {
        ImportOutcome::Replaced
    } else {
        ImportOutcome::Imported
    })
}

/// Enable systemd in `/etc/wsl.conf`, keeping the rest of the file, and
/// restart the distribution.
///
/// Returns `true` if the file was changed.
///
/// # Errors
///
/// Returns an error if writing the file or terminating the distribution fails.
pub async fn enable_systemd(
    shell: &impl ShellExecutor,
    distros: &impl DistroManager,
    name: &str,
    reporter: &impl ProgressReporter,
) -> Result<bool> {
    let current = shell.exec(&["cat", "/etc/wsl.conf"]).await?;
    let existing = if current.status.success() {
        String::from_utf8_lossy(&current.stdout).into_owned()
    } else {
        String::new()
    };
    if wsl_conf_enables_systemd(&existing) {
        tracing::info!(distro = name, "systemd already enabled");
        return Ok(false);
    }

    reporter.step("enabling systemd...");
    let merged = enable_systemd_in_wsl_conf(&existing);
    check_step(
        "write /etc/wsl.conf",
        shell
            .exec_with_stdin(&["tee", "/etc/wsl.conf"], merged.as_bytes())
            .await?,
    )?;
    check_step("wsl --terminate", distros.terminate(name).await?)?;
    reporter.success("systemd enabled");
    Ok(true)
}

/// Install the Docker engine unless `docker` is already on the PATH.
///
/// Returns `true` if packages were installed.
///
/// # Errors
///
/// Returns an error if any install step exits non-zero.
pub async fn install_container_runtime(
    shell: &impl ShellExecutor,
    reporter: &impl ProgressReporter,
) -> Result<bool> {
    let probe = shell.exec(&["sh", "-c", "command -v docker"]).await?;
    if probe.status.success() {
        tracing::info!("docker already installed");
        return Ok(false);
    }

    reporter.step("installing container runtime...");
    for (step, args) in DOCKER_INSTALL_STEPS {
        tracing::info!(step, "running install step");
        check_step(step, shell.exec(args).await?)?;
    }
    reporter.success("container runtime installed");
    Ok(true)
}
