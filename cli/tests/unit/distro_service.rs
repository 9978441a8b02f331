//! Import, systemd, and container-runtime steps inside the distribution.

use std::path::Path;

use wslstack_cli::application::ports::ImportSpec;
use wslstack_cli::application::services::distro::{
    ImportOutcome, enable_systemd, ensure_imported, install_container_runtime,
};
use wslstack_cli::domain::error::ProvisionError;
use wslstack_cli::infra::fs::LocalFs;

use crate::helpers::{err_output, ok_output};
use crate::mocks::{FakeDistros, Quiet, ScriptedShell};

fn spec<'a>(install_dir: &'a Path) -> ImportSpec<'a> {
    ImportSpec {
        name: "wslstack",
        install_dir,
        tarball: Path::new("/cache/rootfs.tar"),
        version: 2,
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

// ── ensure_imported ──────────────────────────────────────────────────────────

#[tokio::test]
async fn imports_when_absent_and_creates_install_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let install_dir = dir.path().join("distros").join("wslstack");
    let distros = FakeDistros::default();

    let outcome = ensure_imported(&distros, &LocalFs::default(), &spec(&install_dir), &[], false, &Quiet)
        .await
        .expect("import");

    assert_eq!(outcome, ImportOutcome::Imported);
    assert_eq!(distros.calls(), vec!["import wslstack rootfs.tar v2"]);
    assert!(install_dir.is_dir());
}

#[tokio::test]
async fn existing_distro_is_left_alone_without_replace() {
    let dir = tempfile::tempdir().expect("tempdir");
    let distros = FakeDistros::with_installed(&["Ubuntu", "WSLStack"]);
    let registered = names(&["Ubuntu", "WSLStack"]);

    let outcome = ensure_imported(&distros, &LocalFs::default(), &spec(dir.path()), &registered, false, &Quiet)
        .await
        .expect("import");

    assert_eq!(outcome, ImportOutcome::AlreadyImported);
    assert!(distros.calls().is_empty());
}

#[tokio::test]
async fn replace_unregisters_before_importing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let distros = FakeDistros::with_installed(&["wslstack"]);
    let registered = names(&["wslstack"]);

    let outcome = ensure_imported(&distros, &LocalFs::default(), &spec(dir.path()), &registered, true, &Quiet)
        .await
        .expect("import");

    assert_eq!(outcome, ImportOutcome::Replaced);
    assert_eq!(
        distros.calls(),
        vec!["unregister wslstack", "import wslstack rootfs.tar v2"]
    );
}

#[tokio::test]
async fn failed_import_reports_step_and_stderr() {
    let dir = tempfile::tempdir().expect("tempdir");
    let distros = FakeDistros {
        import_code: 1,
        ..FakeDistros::default()
    };

    let err = ensure_imported(&distros, &LocalFs::default(), &spec(dir.path()), &[], false, &Quiet)
        .await
        .expect_err("import fails");

    match err.downcast_ref::<ProvisionError>() {
        Some(ProvisionError::StepFailed { step, code, stderr }) => {
            assert_eq!(step, "wsl --import");
            assert_eq!(*code, 1);
            assert!(stderr.contains("could not be completed"));
        }
        other => panic!("expected StepFailed, got {other:?}"),
    }
}

// ── enable_systemd ───────────────────────────────────────────────────────────

#[tokio::test]
async fn systemd_already_enabled_is_a_no_op() {
    let shell = ScriptedShell::default().reply(
        "cat /etc/wsl.conf",
        ok_output(b"[network]\nhostname=box\n\n[boot]\nsystemd = true\n"),
    );
    let distros = FakeDistros::default();

    let changed = enable_systemd(&shell, &distros, "wslstack", &Quiet)
        .await
        .expect("systemd");

    assert!(!changed);
    assert_eq!(shell.calls(), vec!["cat /etc/wsl.conf"]);
    assert!(distros.calls().is_empty());
}

#[tokio::test]
async fn missing_wsl_conf_is_written_and_distro_restarted() {
    let shell = ScriptedShell::default().reply(
        "cat /etc/wsl.conf",
        err_output(1, b"cat: /etc/wsl.conf: No such file or directory"),
    );
    let distros = FakeDistros::default();

    let changed = enable_systemd(&shell, &distros, "wslstack", &Quiet)
        .await
        .expect("systemd");

    assert!(changed);
    let stdin = shell.stdin.borrow();
    assert_eq!(stdin[0].0, "tee /etc/wsl.conf");
    assert_eq!(stdin[0].1, b"[boot]\nsystemd=true\n".to_vec());
    assert_eq!(distros.calls(), vec!["terminate wslstack"]);
}

#[tokio::test]
async fn existing_wsl_conf_sections_survive_enabling_systemd() {
    let shell = ScriptedShell::default().reply(
        "cat /etc/wsl.conf",
        ok_output(b"[user]\ndefault=dev\n[network]\ngenerateResolvConf=false\n"),
    );
    let distros = FakeDistros::default();

    let changed = enable_systemd(&shell, &distros, "wslstack", &Quiet)
        .await
        .expect("systemd");

    assert!(changed);
    let stdin = shell.stdin.borrow();
    let written = String::from_utf8_lossy(&stdin[0].1);
    assert!(written.starts_with("[user]\ndefault=dev\n[network]\ngenerateResolvConf=false\n"), "got: {written}");
    assert!(written.ends_with("[boot]\nsystemd=true\n"), "got: {written}");
    assert_eq!(distros.calls(), vec!["terminate wslstack"]);
}

// ── install_container_runtime ────────────────────────────────────────────────

#[tokio::test]
async fn docker_on_path_skips_install() {
    let shell = ScriptedShell::default().reply("sh -c command -v docker", ok_output(b"/usr/bin/docker\n"));

    let installed = install_container_runtime(&shell, &Quiet).await.expect("runtime");

    assert!(!installed);
    assert_eq!(shell.calls().len(), 1);
}

#[tokio::test]
async fn install_runs_apt_steps_in_order() {
    let shell = ScriptedShell::default().reply("sh -c command -v docker", err_output(1, b""));

    let installed = install_container_runtime(&shell, &Quiet).await.expect("runtime");

    assert!(installed);
    assert_eq!(
        shell.calls()[1..],
        [
            "env DEBIAN_FRONTEND=noninteractive apt-get update",
            "env DEBIAN_FRONTEND=noninteractive apt-get install -y docker.io",
            "systemctl enable --now docker",
        ]
    );
}

#[tokio::test]
async fn failed_apt_step_aborts_remaining_steps() {
    let shell = ScriptedShell::default()
        .reply("sh -c command -v docker", err_output(1, b""))
        .reply(
            "env DEBIAN_FRONTEND=noninteractive apt-get update",
            err_output(100, b"Temporary failure resolving 'archive.ubuntu.com'"),
        );

    let err = install_container_runtime(&shell, &Quiet)
        .await
        .expect_err("apt fails");

    assert!(err.to_string().contains("apt-get update"));
    assert!(err.to_string().contains("Temporary failure resolving"));
    assert!(!shell.ran("env DEBIAN_FRONTEND=noninteractive apt-get install"));
}
