//! Pure helpers for the provisioning steps: archive naming, `wsl.exe` output
//! decoding, `wsl.conf` rendering, checksum lists, and `docker` arguments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::config::ContainerConfig;
use crate::domain::release::ResolvedArtifact;

// ── Provision record ─────────────────────────────────────────────────────────

/// What the last successful WSL provisioning run produced, persisted to
/// `~/.wslstack/state.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionRecord {
    pub distro: String,
    pub artifact: ResolvedArtifact,
    /// SHA-256 of the imported tarball.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tarball_sha256: Option<String>,
    pub provisioned_at: DateTime<Utc>,
}

// ── Archives ─────────────────────────────────────────────────────────────────

/// Compression applied to a downloaded root filesystem archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Already a plain tarball.
    Tar,
    /// gzip (`.tar.gz`, `.tgz`, and packed `.wsl` images).
    Gzip,
    /// xz (`.tar.xz`).
    Xz,
}

/// Classify an archive by file name and compute the name of its
/// uncompressed `.tar` form.
#[must_use]
pub fn classify_archive(file_name: &str) -> Option<(ArchiveKind, String)> {
    let lower = file_name.to_ascii_lowercase();
    let strip = |suffix: &str| file_name[..file_name.len() - suffix.len()].to_string();
    if lower.ends_with(".tar.gz") {
        Some((ArchiveKind::Gzip, format!("{}.tar", strip(".tar.gz"))))
    } else if lower.ends_with(".tgz") {
        Some((ArchiveKind::Gzip, format!("{}.tar", strip(".tgz"))))
    } else if lower.ends_with(".wsl") {
        Some((ArchiveKind::Gzip, format!("{}.tar", strip(".wsl"))))
    } else if lower.ends_with(".tar.xz") {
        Some((ArchiveKind::Xz, format!("{}.tar", strip(".tar.xz"))))
    } else if lower.ends_with(".tar") {
        Some((ArchiveKind::Tar, file_name.to_string()))
    } else {
        None
    }
}

/// Find the checksum for `file_name` in a `SHA256SUMS` listing.
///
/// Lines look like `<hex> *<name>` or `<hex>  <name>`.
#[must_use]
pub fn checksum_for(sums: &str, file_name: &str) -> Option<String> {
    sums.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let hex = parts.next()?;
        let name = parts.next()?.trim_start_matches('*');
        (name == file_name && hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()))
            .then(|| hex.to_ascii_lowercase())
    })
}

// ── wsl.exe ──────────────────────────────────────────────────────────────────

/// Decode `wsl.exe` output, which is UTF-16LE on most Windows builds and
/// UTF-8 when `WSL_UTF8=1` is set.
#[must_use]
pub fn decode_wsl_output(bytes: &[u8]) -> String {
    let looks_utf16 = bytes.starts_with(&[0xFF, 0xFE])
        || (bytes.len() >= 2 && bytes.len() % 2 == 0 && bytes.iter().skip(1).step_by(2).all(|b| *b == 0));
    if looks_utf16 {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
            .trim_start_matches('\u{feff}')
            .to_string()
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

/// Returns `true` if failed `wsl.exe --list` output only says that no
/// distribution is installed, which is how a fresh machine answers.
#[must_use]
pub fn wsl_reports_no_distributions(text: &str) -> bool {
    text.to_ascii_lowercase().contains("no installed distributions")
}

/// Distribution names from `wsl.exe --list --quiet`.
#[must_use]
pub fn parse_distro_list(bytes: &[u8]) -> Vec<String> {
    decode_wsl_output(bytes)
        .lines()
        .map(|l| l.trim_matches(|c: char| c.is_whitespace() || c == '\0'))
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

const SYSTEMD_LINE: &str = "systemd=true";

/// `existing` `/etc/wsl.conf` contents with `systemd=true` set under `[boot]`.
///
/// Other sections and keys are kept as written. A `systemd` key already in
/// `[boot]` is replaced in place; without a `[boot]` section one is appended.
#[must_use]
pub fn enable_systemd_in_wsl_conf(existing: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut in_boot = false;
    let mut written = false;
    for line in existing.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            if in_boot && !written {
                out.push(SYSTEMD_LINE);
                written = true;
            }
            in_boot = trimmed.eq_ignore_ascii_case("[boot]");
            out.push(line);
            continue;
        }
        let is_systemd_key = trimmed
            .split_once('=')
            .is_some_and(|(key, _)| key.trim() == "systemd");
        if in_boot && is_systemd_key {
            if !written {
                out.push(SYSTEMD_LINE);
                written = true;
            }
            continue;
        }
        out.push(line);
    }
    if !written {
        if !in_boot {
            if out.last().is_some_and(|l| !l.trim().is_empty()) {
                out.push("");
            }
            out.push("[boot]");
        }
        out.push(SYSTEMD_LINE);
    }
    let mut merged = out.join("\n");
    merged.push('\n');
    merged
}

/// Returns `true` if an existing `wsl.conf` already enables systemd under `[boot]`.
#[must_use]
pub fn wsl_conf_enables_systemd(conf: &str) -> bool {
    let mut in_boot = false;
    for line in conf.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_boot = line.eq_ignore_ascii_case("[boot]");
            continue;
        }
        if in_boot
            && let Some((key, value)) = line.split_once('=')
            && key.trim() == "systemd"
            && value.trim().eq_ignore_ascii_case("true")
        {
            return true;
        }
    }
    false
}

// ── docker ───────────────────────────────────────────────────────────────────

/// Lifecycle state of the named container, from `docker ps -a --format {{.State}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerState {
    Absent,
    Running,
    /// Exists but is not running (`exited`, `created`, `paused`, ...).
    Stopped(String),
}

#[must_use]
pub fn parse_container_state(stdout: &str) -> ContainerState {
    match stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
        None => ContainerState::Absent,
        Some("running") => ContainerState::Running,
        Some(other) => ContainerState::Stopped(other.to_string()),
    }
}

/// Arguments after `docker` that report the container's state.
#[must_use]
pub fn container_inspect_args(name: &str) -> Vec<String> {
    vec![
        "ps".into(),
        "-a".into(),
        "--filter".into(),
        format!("name=^/{name}$"),
        "--format".into(),
        "{{.State}}".into(),
    ]
}

/// Arguments after `docker` that create and start the container.
#[must_use]
pub fn container_run_args(cfg: &ContainerConfig) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "run".into(),
        "-d".into(),
        "--name".into(),
        cfg.name.clone(),
        "--restart".into(),
        cfg.restart.clone(),
        "-v".into(),
        format!("{}:{}", cfg.volume, cfg.mount),
    ];
    for bind in &cfg.binds {
        args.push("-v".into());
        args.push(bind.clone());
    }
    for port in &cfg.ports {
        args.push("-p".into());
        args.push(port.clone());
    }
    for env in &cfg.env {
        args.push("-e".into());
        args.push(env.clone());
    }
    args.push(cfg.image.clone());
    args
}
