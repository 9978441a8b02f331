//! Release candidates, resolved artifacts, and candidate URL construction.
//!
//! Pure functions only, no I/O.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

/// An Ubuntu release that may have a downloadable WSL root filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseCandidate {
    /// Release version, e.g. `"24.04"`.
    pub version: String,
    /// Release codename, e.g. `"noble"`.
    pub codename: String,
    /// Date the release was published.
    pub release_date: NaiveDate,
}

impl ReleaseCandidate {
    #[must_use]
    pub fn new(version: &str, codename: &str, release_date: NaiveDate) -> Self {
        Self {
            version: version.to_string(),
            codename: codename.to_string(),
            release_date,
        }
    }

    /// Short label used in progress output and errors: `24.04 (noble)`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.version, self.codename)
    }
}

/// A release whose root filesystem archive was confirmed reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArtifact {
    pub version: String,
    pub codename: String,
    pub rootfs_uri: String,
    pub release_date: NaiveDate,
}

impl ResolvedArtifact {
    #[must_use]
    pub fn from_candidate(candidate: &ReleaseCandidate, uri: &Url) -> Self {
        Self {
            version: candidate.version.clone(),
            codename: candidate.codename.clone(),
            rootfs_uri: uri.to_string(),
            release_date: candidate.release_date,
        }
    }

    /// File name of the artifact, taken from the last URL path segment.
    #[must_use]
    pub fn file_name(&self) -> Option<String> {
        file_name_from_uri(&self.rootfs_uri)
    }
}

/// Built-in release list, newest first.
#[must_use]
pub fn default_candidates() -> Vec<ReleaseCandidate> {
    [
        ("24.04", "noble", (2024, 4, 25)),
        ("22.04", "jammy", (2022, 4, 21)),
        ("20.04", "focal", (2020, 4, 23)),
    ]
    .into_iter()
    .filter_map(|(version, codename, (y, m, d))| {
        NaiveDate::from_ymd_opt(y, m, d).map(|date| ReleaseCandidate::new(version, codename, date))
    })
    .collect()
}

/// Default base-location templates, probed in order.
pub const DEFAULT_BASE_URLS: &[&str] = &[
    "https://cloud-images.ubuntu.com/wsl/{codename}/current/",
    "https://cloud-images.ubuntu.com/wsl/daily/{codename}/current/",
];

/// Default well-known filename templates, probed in order for each base.
pub const DEFAULT_FILENAMES: &[&str] = &[
    "ubuntu-{codename}-wsl-{arch}-wsl.rootfs.tar.gz",
    "ubuntu-{codename}-wsl-{arch}-wsl.rootfs.tar.xz",
    "ubuntu-{codename}-wsl-{arch}-ubuntu.wsl",
    "rootfs.tar.gz",
    "rootfs.tar.xz",
];

/// Suffix of a packed WSL image.
pub const PACKED_IMAGE_SUFFIX: &str = ".wsl";

/// Produces the ordered base locations and filenames to try for a candidate.
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    pub arch: String,
    pub base_urls: Vec<String>,
    pub filenames: Vec<String>,
}

impl Default for ArtifactLocator {
    fn default() -> Self {
        Self {
            arch: host_arch().to_string(),
            base_urls: DEFAULT_BASE_URLS.iter().map(ToString::to_string).collect(),
            filenames: DEFAULT_FILENAMES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl ArtifactLocator {
    /// Expand `{codename}`, `{version}` and `{arch}` placeholders.
    #[must_use]
    pub fn expand(&self, template: &str, candidate: &ReleaseCandidate) -> String {
        template
            .replace("{codename}", &candidate.codename)
            .replace("{version}", &candidate.version)
            .replace("{arch}", &self.arch)
    }

    /// Base locations for a candidate, in probe order. Templates that expand to
    /// an empty or unparseable URL are dropped.
    #[must_use]
    pub fn base_locations(&self, candidate: &ReleaseCandidate) -> Vec<Url> {
        self.base_urls
            .iter()
            .filter_map(|t| parse_base(&self.expand(t, candidate)))
            .collect()
    }

    /// Well-known candidate URLs under `base`, in probe order.
    #[must_use]
    pub fn well_known_uris(&self, base: &Url, candidate: &ReleaseCandidate) -> Vec<Url> {
        self.filenames
            .iter()
            .map(|t| self.expand(t, candidate))
            .filter(|name| !name.trim().is_empty())
            .filter_map(|name| base.join(&name).ok())
            .collect()
    }
}

/// Parse a base location, forcing a trailing slash so relative joins land
/// inside the directory rather than replacing its last segment.
#[must_use]
pub fn parse_base(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let mut url = Url::parse(raw).ok()?;
    if url.cannot_be_a_base() {
        return None;
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Some(url)
}

/// Last non-empty path segment of a URL.
#[must_use]
pub fn file_name_from_uri(uri: &str) -> Option<String> {
    let url = Url::parse(uri).ok()?;
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()
        .map(str::to_string)
}

/// Debian-style architecture name of the running host.
#[must_use]
pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "aarch64" => "arm64",
        _ => "amd64",
    }
}

/// Keep only the candidates whose version appears in `versions`, preserving
/// the original newest-first order. An empty filter keeps everything.
///
/// # Errors
///
/// Returns the first requested version that is not in `candidates`.
pub fn filter_candidates(
    candidates: &[ReleaseCandidate],
    versions: &[String],
) -> Result<Vec<ReleaseCandidate>, String> {
    if versions.is_empty() {
        return Ok(candidates.to_vec());
    }
    if let Some(unknown) = versions
        .iter()
        .find(|v| !candidates.iter().any(|c| &c.version == *v || &c.codename == *v))
    {
        return Err(unknown.clone());
    }
    Ok(candidates
        .iter()
        .filter(|c| versions.iter().any(|v| v == &c.version || v == &c.codename))
        .cloned()
        .collect())
}
