//! Application service: end-to-end provisioning flows.
//!
//! `provision_wsl` chains resolve → download → decompress → import →
//! systemd → container runtime → container, strictly in that order, and
//! aborts on the first failure. `provision_host` runs only the container step
//! against the local Docker engine.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::application::ports::{
    ArchiveExpander, ArtifactDownloader, ArtifactProbe, DistroManager, FileHasher, ImportSpec,
    IndexFetcher, LocalFs, ProgressReporter, ProvisionStateStore, ShellExecutor,
};
use crate::application::services::artifact::{CachePorts, CachedArtifact, ensure_tarball};
use crate::application::services::container::{ContainerOutcome, Docker, ensure_container};
use crate::application::services::distro::{
    ImportOutcome, check_step, enable_systemd, ensure_imported, install_container_runtime,
};
use crate::application::services::resolver::resolve_artifact;
use crate::domain::config::ContainerConfig;
use crate::domain::provision::ProvisionRecord;
use crate::domain::release::{ArtifactLocator, ReleaseCandidate, ResolvedArtifact};

/// Collaborators for the WSL flow.
pub struct ProvisionPorts<'a, P, I, D, E, H, F, M, S, T> {
    pub probe: &'a P,
    pub index: &'a I,
    pub downloader: &'a D,
    pub expander: &'a E,
    pub hasher: &'a H,
    pub fs: &'a F,
    pub distros: &'a M,
    /// Shell inside the target distribution.
    pub shell: &'a S,
    pub state: &'a T,
}

/// Inputs for the WSL flow.
pub struct ProvisionOptions<'a> {
    /// Release candidates, newest first.
    pub candidates: &'a [ReleaseCandidate],
    pub locator: &'a ArtifactLocator,
    pub cache_dir: &'a Path,
    pub distro: &'a str,
    pub install_dir: &'a Path,
    pub wsl_version: u8,
    /// Distributions registered when the run started.
    pub registered: &'a [String],
    /// Unregister and re-import an existing distribution of the same name.
    pub replace: bool,
    /// Container to launch, or `None` to stop after installing the runtime.
    pub container: Option<&'a ContainerConfig>,
}

/// Summary of a completed WSL run.
#[derive(Debug)]
pub struct ProvisionOutcome {
    pub artifact: ResolvedArtifact,
    pub cache: CachedArtifact,
    pub import: ImportOutcome,
    pub systemd_enabled: bool,
    pub runtime_installed: bool,
    pub container: Option<ContainerOutcome>,
}

/// Provision a WSL distribution with a container runtime and container.
///
/// # Errors
///
/// Returns an error if resolution finds no artifact or any later step fails.
/// Nothing is retried.
pub async fn provision_wsl<P, I, D, E, H, F, M, S, T>(
    ports: &ProvisionPorts<'_, P, I, D, E, H, F, M, S, T>,
    opts: &ProvisionOptions<'_>,
    reporter: &impl ProgressReporter,
) -> Result<ProvisionOutcome>
where
    P: ArtifactProbe,
    I: IndexFetcher,
    D: ArtifactDownloader,
    E: ArchiveExpander,
    H: FileHasher,
    F: LocalFs,
    M: DistroManager,
    S: ShellExecutor,
    T: ProvisionStateStore,
{
    let artifact =
        resolve_artifact(opts.candidates, opts.locator, ports.probe, ports.index, reporter).await?;

    let cache_ports = CachePorts {
        downloader: ports.downloader,
        index: ports.index,
        hasher: ports.hasher,
        expander: ports.expander,
        fs: ports.fs,
    };
    let cache = ensure_tarball(&artifact, opts.cache_dir, &cache_ports, reporter).await?;

    let import = ensure_imported(
        ports.distros,
        ports.fs,
        &ImportSpec {
            name: opts.distro,
            install_dir: opts.install_dir,
            tarball: &cache.tarball,
            version: opts.wsl_version,
        },
        opts.registered,
        opts.replace,
        reporter,
    )
    .await?;

    let systemd_enabled = enable_systemd(ports.shell, ports.distros, opts.distro, reporter).await?;
    let runtime_installed = install_container_runtime(ports.shell, reporter).await?;

    let container = match opts.container {
        Some(cfg) => Some(ensure_container(&Docker::new(ports.shell, false), cfg, reporter).await?),
        None => None,
    };

    record_provision(ports, opts.distro, &artifact, &cache, import).await?;

    Ok(ProvisionOutcome {
        artifact,
        cache,
        import,
        systemd_enabled,
        runtime_installed,
        container,
    })
}

/// Persist what was imported. The tarball is hashed only when this run
/// imported it; otherwise an earlier hash for the same artifact is kept.
async fn record_provision<P, I, D, E, H, F, M, S, T>(
    ports: &ProvisionPorts<'_, P, I, D, E, H, F, M, S, T>,
    distro: &str,
    artifact: &ResolvedArtifact,
    cache: &CachedArtifact,
    import: ImportOutcome,
) -> Result<()>
where
    H: FileHasher,
    T: ProvisionStateStore,
{
    let previous = ports.state.load_async().await.ok().flatten();
    let tarball_sha256 = if import == ImportOutcome::AlreadyImported {
        previous
            .filter(|r| r.distro == distro && r.artifact.rootfs_uri == artifact.rootfs_uri)
            .and_then(|r| r.tarball_sha256)
    } else {
        Some(ports.hasher.sha256_file(&cache.tarball)?)
    };
    let record = ProvisionRecord {
        distro: distro.to_string(),
        artifact: artifact.clone(),
        tarball_sha256,
        provisioned_at: Utc::now(),
    };
    ports
        .state
        .save_async(&record)
        .await
        .context("saving provisioning record")
}

/// Launch the configured container directly on this host.
///
/// # Errors
///
/// Returns an error if Docker is not available or any `docker` call fails.
pub async fn provision_host(
    shell: &impl ShellExecutor,
    cfg: &ContainerConfig,
    sudo: bool,
    reporter: &impl ProgressReporter,
) -> Result<ContainerOutcome> {
    let docker_version: &[&str] = if sudo {
        &["sudo", "docker", "version", "--format", "{{.Server.Version}}"]
    } else {
        &["docker", "version", "--format", "{{.Server.Version}}"]
    };
    let version = shell
        .exec(docker_version)
        .await
        .and_then(|output| check_step("docker version", output))
        .context("Docker engine not reachable on this host")?;
    tracing::info!(
        version = %String::from_utf8_lossy(&version.stdout).trim(),
        "docker engine detected"
    );
    ensure_container(&Docker::new(shell, sudo), cfg, reporter).await
}
