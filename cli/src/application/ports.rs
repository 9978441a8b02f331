//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::Result;
use url::Url;

use crate::domain::StackConfig;
use crate::domain::provision::{ArchiveKind, ProvisionRecord};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Result of a lightweight reachability check on a candidate URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered with a status in `[200, 400)`.
    Available { status: u16 },
    /// The server answered, but with any other status.
    Absent { status: u16 },
    /// No answer: DNS, TLS, connection or timeout failure.
    Unreachable { reason: String },
}

impl ProbeOutcome {
    /// Classify an HTTP status code.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        if (200..400).contains(&status) {
            Self::Available { status }
        } else {
            Self::Absent { status }
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

/// Parameters for `wsl.exe --import`.
pub struct ImportSpec<'a> {
    /// Distribution name.
    pub name: &'a str,
    /// Directory that will hold the distribution's virtual disk.
    pub install_dir: &'a Path,
    /// Uncompressed root filesystem tarball.
    pub tarball: &'a Path,
    /// WSL version (1 or 2).
    pub version: u8,
}

// ── Network Ports ─────────────────────────────────────────────────────────────

/// Existence check for a remote artifact (HEAD-equivalent, never a download).
#[allow(async_fn_in_trait)]
pub trait ArtifactProbe {
    /// Probe `uri`. Implementations never fail; every error is an outcome.
    async fn probe(&self, uri: &Url) -> ProbeOutcome;
}

/// Fetches the raw text of a directory-listing page.
#[allow(async_fn_in_trait)]
pub trait IndexFetcher {
    /// Fetch `uri` as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the page is unreachable or answers with an error status.
    async fn fetch_index(&self, uri: &Url) -> Result<String>;
}

/// Downloads an artifact to a local path.
#[allow(async_fn_in_trait)]
pub trait ArtifactDownloader {
    /// Download `uri` to `dest`, resuming a previous partial download if present.
    async fn download(&self, uri: &str, dest: &Path) -> Result<()>;
}

// ── Archive and Filesystem Ports ──────────────────────────────────────────────

/// Turns a compressed root filesystem archive into a plain tarball.
#[allow(async_fn_in_trait)]
pub trait ArchiveExpander {
    /// Decompress `src` into `dest`.
    async fn expand(&self, kind: ArchiveKind, src: &Path, dest: &Path) -> Result<()>;
    /// Check that `path` is a readable tar archive with at least one entry.
    async fn verify_tarball(&self, path: &Path) -> Result<()>;
}

/// Abstracts file hashing operations.
pub trait FileHasher {
    /// Compute the SHA-256 hash of a file.
    fn sha256_file(&self, path: &Path) -> Result<String>;
}

/// Abstracts the filesystem operations the provisioning services need.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
}

/// Abstracts local directory defaults.
pub trait LocalPaths {
    /// Directory where downloaded archives are cached.
    fn cache_dir(&self) -> Result<PathBuf>;
    /// Directory where a distribution named `name` is installed.
    fn install_dir(&self, name: &str) -> Result<PathBuf>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
}

// ── Distribution and Shell Ports ──────────────────────────────────────────────

/// WSL distribution management.
#[allow(async_fn_in_trait)]
pub trait DistroManager {
    /// Names of all registered distributions.
    async fn list(&self) -> Result<Vec<String>>;
    /// Register a distribution from a tarball.
    async fn import(&self, spec: &ImportSpec<'_>) -> Result<Output>;
    /// Unregister a distribution and delete its disk.
    async fn unregister(&self, name: &str) -> Result<Output>;
    /// Stop a running distribution.
    async fn terminate(&self, name: &str) -> Result<Output>;
}

/// Command execution in the provisioning target (a distribution or the host).
#[allow(async_fn_in_trait)]
pub trait ShellExecutor {
    /// Execute a command and capture output.
    async fn exec(&self, args: &[&str]) -> Result<Output>;
    /// Execute a command with stdin piped from `input`.
    async fn exec_with_stdin(&self, args: &[&str], input: &[u8]) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Config and State Ports ────────────────────────────────────────────────────

/// Abstracts configuration persistence.
pub trait ConfigStore {
    /// Load the configuration, returning defaults if none is stored.
    fn load(&self) -> Result<StackConfig>;
    /// Persist the configuration.
    fn save(&self, config: &StackConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}

/// Abstracts persistence of the last provisioning record.
#[allow(async_fn_in_trait)]
pub trait ProvisionStateStore {
    /// Load the last record, returning `None` if none exists.
    async fn load_async(&self) -> Result<Option<ProvisionRecord>>;
    /// Persist a record.
    async fn save_async(&self, record: &ProvisionRecord) -> Result<()>;
}
