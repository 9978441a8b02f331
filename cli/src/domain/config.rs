//! Domain types and validators for wslstack configuration.
//!
//! Pure functions only, no I/O.

use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::release::{
    ArtifactLocator, DEFAULT_BASE_URLS, DEFAULT_FILENAMES, ReleaseCandidate, default_candidates,
    host_arch,
};

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "distro.name",
    "mirror.arch",
    "container.name",
    "container.image",
    "container.volume",
    "container.mount",
    "host.sudo",
];
pub const VALID_ARCHES: &[&str] = &["amd64", "arm64"];
pub const VALID_BOOLS: &[&str] = &["true", "false"];

#[allow(clippy::expect_used)] // Compile-time constant pattern
static DISTRO_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,63}$").expect("valid regex"));

#[allow(clippy::expect_used)] // Compile-time constant pattern
static DOCKER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("valid regex"));

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.wslstack/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    pub distro: DistroConfig,
    pub paths: PathsConfig,
    pub mirror: MirrorConfig,
    /// Release candidates, newest first.
    pub releases: Vec<ReleaseCandidate>,
    pub container: ContainerConfig,
    pub host: HostConfig,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            distro: DistroConfig::default(),
            paths: PathsConfig::default(),
            mirror: MirrorConfig::default(),
            releases: default_candidates(),
            container: ContainerConfig::default(),
            host: HostConfig::default(),
        }
    }
}

impl StackConfig {
    /// Build the artifact locator from the mirror section.
    #[must_use]
    pub fn locator(&self) -> ArtifactLocator {
        ArtifactLocator {
            arch: self.mirror.arch.clone(),
            base_urls: self.mirror.base_urls.clone(),
            filenames: self.mirror.filenames.clone(),
        }
    }
}

/// WSL distribution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistroConfig {
    /// Name the distribution is registered under.
    pub name: String,
    /// Parent of the per-distribution install directories. A distribution
    /// named `<name>` keeps its virtual disk in `<install_dir>/<name>`, so
    /// `--name` never shares a disk with another distribution. Defaults to
    /// `<data dir>/wslstack/distros` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<PathBuf>,
    /// WSL version passed to `--import`.
    pub wsl_version: u8,
}

impl Default for DistroConfig {
    fn default() -> Self {
        Self {
            name: "wslstack".to_string(),
            install_dir: None,
            wsl_version: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PathsConfig {
    /// Download cache. Defaults to `<data dir>/wslstack/cache` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

/// Where root filesystem archives are looked up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub arch: String,
    /// Base location templates (`{codename}`, `{version}`, `{arch}`).
    pub base_urls: Vec<String>,
    /// Well-known filename templates tried under each base.
    pub filenames: Vec<String>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            arch: host_arch().to_string(),
            base_urls: DEFAULT_BASE_URLS.iter().map(ToString::to_string).collect(),
            filenames: DEFAULT_FILENAMES.iter().map(ToString::to_string).collect(),
        }
    }
}

/// The single container launched inside the distribution (or on the host).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub name: String,
    pub image: String,
    /// Named volume persisted across container re-creation.
    pub volume: String,
    /// Mount point of `volume` inside the container.
    pub mount: String,
    /// Extra `host:container` bind mounts.
    pub binds: Vec<String>,
    /// Published ports in `docker run -p` syntax.
    pub ports: Vec<String>,
    /// `KEY=VALUE` environment entries.
    pub env: Vec<String>,
    pub restart: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "portainer".to_string(),
            image: "portainer/portainer-ce:lts".to_string(),
            volume: "portainer_data".to_string(),
            mount: "/data".to_string(),
            binds: vec!["/var/run/docker.sock:/var/run/docker.sock".to_string()],
            ports: vec!["9443:9443".to_string()],
            env: Vec::new(),
            restart: "unless-stopped".to_string(),
        }
    }
}

/// Settings for `wslstack host`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Prefix docker invocations with `sudo`.
    pub sudo: bool,
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |valid: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        valid: valid.to_string(),
    };
    match key {
        "distro.name" if !DISTRO_NAME.is_match(value) => {
            Err(invalid("letters, digits, '.', '_' and '-' (max 64)").into())
        }
        "container.name" | "container.volume" if !DOCKER_NAME.is_match(value) => {
            Err(invalid("[a-zA-Z0-9][a-zA-Z0-9_.-]*").into())
        }
        "container.image" if value.trim().is_empty() || value.contains(char::is_whitespace) => {
            Err(invalid("a docker image reference, e.g. nginx:latest").into())
        }
        "container.mount" if !value.starts_with('/') => Err(invalid("an absolute path").into()),
        "mirror.arch" if !VALID_ARCHES.contains(&value) => Err(invalid(&VALID_ARCHES.join(", ")).into()),
        "host.sudo" if !VALID_BOOLS.contains(&value) => Err(invalid(&VALID_BOOLS.join(", ")).into()),
        _ => Ok(()),
    }
}

/// Apply an already-validated `key = value` to `config`.
///
/// # Errors
///
/// Returns an error if the key is unknown.
pub fn apply_config_value(config: &mut StackConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "distro.name" => config.distro.name = value.to_string(),
        "mirror.arch" => config.mirror.arch = value.to_string(),
        "container.name" => config.container.name = value.to_string(),
        "container.image" => config.container.image = value.to_string(),
        "container.volume" => config.container.volume = value.to_string(),
        "container.mount" => config.container.mount = value.to_string(),
        "host.sudo" => config.host.sudo = value == "true",
        _ => {
            return Err(ConfigError::UnknownKey {
                key: key.to_string(),
                valid: VALID_CONFIG_KEYS.join(", "),
            }
            .into());
        }
    }
    Ok(())
}

/// Validates a distribution name (used for `--name` overrides).
///
/// # Errors
///
/// Returns an error if the name is not a valid WSL distribution name.
pub fn validate_distro_name(name: &str) -> Result<()> {
    validate_config_value("distro.name", name)
}

// ── Unit tests ───────────────────────────────────────────────────────────────
