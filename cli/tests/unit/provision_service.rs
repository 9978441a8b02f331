//! End-to-end WSL and host flows with every port faked except the cache.

use std::path::Path;

use wslstack_cli::application::services::container::ContainerOutcome;
use wslstack_cli::application::services::distro::ImportOutcome;
use wslstack_cli::application::services::provision::{
    ProvisionOptions, ProvisionPorts, provision_host, provision_wsl,
};
use wslstack_cli::domain::config::ContainerConfig;
use wslstack_cli::domain::error::ResolveError;
use wslstack_cli::domain::release::{ArtifactLocator, ReleaseCandidate};
use wslstack_cli::infra::archive::LocalArchiveExpander;
use wslstack_cli::infra::fs::LocalFs;

use crate::helpers::{amd64_locator, err_output, gzip, noble, noble_artifact, ok_output, sha256_hex, tiny_tar};
use crate::mocks::{FakeDistros, FakeMirror, MemoryState, Quiet, RecordingReporter, ScriptedShell, docker_ps};

const GZ_NAME: &str = "ubuntu-noble-wsl-amd64-wsl.rootfs.tar.gz";

fn serving_noble() -> FakeMirror {
    let uri = noble_artifact(GZ_NAME).rootfs_uri;
    FakeMirror::default()
        .with_available(&uri)
        .with_file(&uri, gzip(&tiny_tar()))
}

fn options<'a>(
    candidates: &'a [ReleaseCandidate],
    locator: &'a ArtifactLocator,
    cache_dir: &'a Path,
    install_dir: &'a Path,
    container: Option<&'a ContainerConfig>,
) -> ProvisionOptions<'a> {
    ProvisionOptions {
        candidates,
        locator,
        cache_dir,
        distro: "wslstack",
        install_dir,
        wsl_version: 2,
        registered: &[],
        replace: false,
        container,
    }
}

#[tokio::test]
async fn fresh_machine_runs_every_step_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (cache_dir, install_dir) = (dir.path().join("cache"), dir.path().join("distro"));
    let mirror = serving_noble();
    let fs = LocalFs::default();
    let distros = FakeDistros::default();
    let shell = ScriptedShell::default().reply("sh -c command -v docker", err_output(1, b""));
    let state = MemoryState::default();
    let container = ContainerConfig::default();
    let candidates = [noble()];
    let locator = amd64_locator();
    let reporter = RecordingReporter::default();

    let ports = ProvisionPorts {
        probe: &mirror,
        index: &mirror,
        downloader: &mirror,
        expander: &LocalArchiveExpander,
        hasher: &fs,
        fs: &fs,
        distros: &distros,
        shell: &shell,
        state: &state,
    };
    let outcome = provision_wsl(
        &ports,
        &options(&candidates, &locator, &cache_dir, &install_dir, Some(&container)),
        &reporter,
    )
    .await
    .expect("provision");

    assert_eq!(outcome.artifact, noble_artifact(GZ_NAME));
    assert!(outcome.cache.downloaded && outcome.cache.expanded);
    assert_eq!(outcome.import, ImportOutcome::Imported);
    assert!(outcome.systemd_enabled);
    assert!(outcome.runtime_installed);
    assert_eq!(outcome.container, Some(ContainerOutcome::Created));

    assert_eq!(
        distros.calls(),
        vec![
            "import wslstack ubuntu-noble-wsl-amd64-wsl.rootfs.tar v2",
            "terminate wslstack",
        ]
    );
    let calls = shell.calls();
    let position = |prefix: &str| {
        calls
            .iter()
            .position(|c| c.starts_with(prefix))
            .unwrap_or_else(|| panic!("{prefix} never ran: {calls:?}"))
    };
    assert!(position("tee /etc/wsl.conf") < position("env DEBIAN_FRONTEND=noninteractive apt-get update"));
    assert!(position("systemctl enable --now docker") < position("docker volume create"));
    assert!(position("docker volume create") < position("docker run"));

    let record = state.record.borrow().clone().expect("record saved");
    assert_eq!(record.distro, "wslstack");
    assert_eq!(record.artifact.rootfs_uri, outcome.artifact.rootfs_uri);
    assert_eq!(record.tarball_sha256, Some(sha256_hex(&tiny_tar())));
}

#[tokio::test]
async fn second_run_reuses_everything_and_keeps_recorded_hash() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (cache_dir, install_dir) = (dir.path().join("cache"), dir.path().join("distro"));
    let mirror = serving_noble();
    let fs = LocalFs::default();
    let distros = FakeDistros::default();
    let state = MemoryState::default();
    let container = ContainerConfig::default();
    let candidates = [noble()];
    let locator = amd64_locator();

    let first_shell = ScriptedShell::default();
    let ports = ProvisionPorts {
        probe: &mirror,
        index: &mirror,
        downloader: &mirror,
        expander: &LocalArchiveExpander,
        hasher: &fs,
        fs: &fs,
        distros: &distros,
        shell: &first_shell,
        state: &state,
    };
    let opts = options(&candidates, &locator, &cache_dir, &install_dir, Some(&container));
    provision_wsl(&ports, &opts, &Quiet).await.expect("first run");
    let first_sha = state.record.borrow().clone().and_then(|r| r.tarball_sha256);

    let registered = vec!["wslstack".to_string()];
    let opts = ProvisionOptions {
        registered: &registered,
        ..opts
    };
    let settled = ScriptedShell::default()
        .reply("cat /etc/wsl.conf", ok_output(b"[boot]\nsystemd=true\n"))
        .reply(&docker_ps("portainer"), ok_output(b"running\n"));
    let ports = ProvisionPorts {
        shell: &settled,
        ..ports
    };
    let outcome = provision_wsl(&ports, &opts, &Quiet).await.expect("second run");

    assert!(!outcome.cache.downloaded && !outcome.cache.expanded);
    assert_eq!(outcome.import, ImportOutcome::AlreadyImported);
    assert!(!outcome.systemd_enabled);
    assert!(!outcome.runtime_installed);
    assert_eq!(outcome.container, Some(ContainerOutcome::AlreadyRunning));
    assert_eq!(mirror.downloads.borrow().len(), 1);
    assert_eq!(*state.saves.borrow(), 2);
    assert_eq!(state.record.borrow().clone().and_then(|r| r.tarball_sha256), first_sha);
}

#[tokio::test]
async fn unresolvable_release_touches_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mirror = FakeMirror::default();
    let fs = LocalFs::default();
    let distros = FakeDistros::default();
    let shell = ScriptedShell::default();
    let state = MemoryState::default();
    let candidates = [noble()];
    let locator = amd64_locator();

    let ports = ProvisionPorts {
        probe: &mirror,
        index: &mirror,
        downloader: &mirror,
        expander: &LocalArchiveExpander,
        hasher: &fs,
        fs: &fs,
        distros: &distros,
        shell: &shell,
        state: &state,
    };
    let err = provision_wsl(
        &ports,
        &options(&candidates, &locator, dir.path(), dir.path(), None),
        &Quiet,
    )
    .await
    .expect_err("nothing to resolve");

    assert!(matches!(
        err.downcast_ref::<ResolveError>(),
        Some(ResolveError::NoArtifactFound { .. })
    ));
    assert!(mirror.downloads.borrow().is_empty());
    assert!(distros.calls().is_empty());
    assert!(shell.calls().is_empty());
    assert_eq!(*state.saves.borrow(), 0);
}

#[tokio::test]
async fn without_container_stops_after_runtime() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (cache_dir, install_dir) = (dir.path().join("cache"), dir.path().join("distro"));
    let mirror = serving_noble();
    let fs = LocalFs::default();
    let distros = FakeDistros::default();
    let shell = ScriptedShell::default();
    let state = MemoryState::default();
    let candidates = [noble()];
    let locator = amd64_locator();

    let ports = ProvisionPorts {
        probe: &mirror,
        index: &mirror,
        downloader: &mirror,
        expander: &LocalArchiveExpander,
        hasher: &fs,
        fs: &fs,
        distros: &distros,
        shell: &shell,
        state: &state,
    };
    let outcome = provision_wsl(
        &ports,
        &options(&candidates, &locator, &cache_dir, &install_dir, None),
        &Quiet,
    )
    .await
    .expect("provision");

    assert_eq!(outcome.container, None);
    assert!(!shell.ran("docker"));
    assert_eq!(*state.saves.borrow(), 1);
}

#[tokio::test]
async fn failed_import_aborts_before_touching_the_distribution() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (cache_dir, install_dir) = (dir.path().join("cache"), dir.path().join("distro"));
    let mirror = serving_noble();
    let fs = LocalFs::default();
    let distros = FakeDistros {
        import_code: 5,
        ..FakeDistros::default()
    };
    let shell = ScriptedShell::default();
    let state = MemoryState::default();
    let candidates = [noble()];
    let locator = amd64_locator();

    let ports = ProvisionPorts {
        probe: &mirror,
        index: &mirror,
        downloader: &mirror,
        expander: &LocalArchiveExpander,
        hasher: &fs,
        fs: &fs,
        distros: &distros,
        shell: &shell,
        state: &state,
    };
    let err = provision_wsl(
        &ports,
        &options(&candidates, &locator, &cache_dir, &install_dir, None),
        &Quiet,
    )
    .await
    .expect_err("import fails");

    assert!(err.to_string().contains("wsl --import"));
    assert!(shell.calls().is_empty());
    assert_eq!(*state.saves.borrow(), 0);
}

// ── Host flow ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn host_checks_engine_then_creates_container() {
    let shell = ScriptedShell::default().reply(
        "docker version --format {{.Server.Version}}",
        ok_output(b"27.3.1\n"),
    );

    let outcome = provision_host(&shell, &ContainerConfig::default(), false, &Quiet)
        .await
        .expect("host");

    assert_eq!(outcome, ContainerOutcome::Created);
    assert_eq!(shell.calls()[0], "docker version --format {{.Server.Version}}");
    assert!(shell.ran("docker run"));
}

#[tokio::test]
async fn host_with_sudo_prefixes_version_check() {
    let shell = ScriptedShell::default().reply(
        &format!("sudo {}", docker_ps("portainer")),
        ok_output(b"running\n"),
    );

    let outcome = provision_host(&shell, &ContainerConfig::default(), true, &Quiet)
        .await
        .expect("host");

    assert_eq!(outcome, ContainerOutcome::AlreadyRunning);
    assert_eq!(shell.calls()[0], "sudo docker version --format {{.Server.Version}}");
}

#[tokio::test]
async fn host_without_engine_fails_with_context() {
    let shell = ScriptedShell::default().reply(
        "docker version --format {{.Server.Version}}",
        err_output(1, b"Cannot connect to the Docker daemon at unix:///var/run/docker.sock"),
    );

    let err = provision_host(&shell, &ContainerConfig::default(), false, &Quiet)
        .await
        .expect_err("no engine");

    let msg = format!("{err:#}");
    assert!(msg.contains("Docker engine not reachable"));
    assert!(msg.contains("Cannot connect to the Docker daemon"));
    assert_eq!(shell.calls().len(), 1);
}
