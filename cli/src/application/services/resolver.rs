//! Application service: release/artifact resolution.
//!
//! Walks the release candidates newest-first and returns the first one whose
//! root filesystem archive answers a reachability probe. For each base
//! location the well-known filenames are tried first; the directory listing
//! is only fetched and scraped when none of them answer.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use url::Url;

use crate::application::ports::{ArtifactProbe, IndexFetcher, ProbeOutcome, ProgressReporter};
use crate::domain::error::ResolveError;
use crate::domain::index::rootfs_links;
use crate::domain::release::{ArtifactLocator, ReleaseCandidate, ResolvedArtifact};

/// Resolve the newest release with a reachable root filesystem archive.
///
/// # Errors
///
/// Returns [`ResolveError::NoArtifactFound`] when every candidate is exhausted.
pub async fn resolve_artifact(
    candidates: &[ReleaseCandidate],
    locator: &ArtifactLocator,
    probe: &impl ArtifactProbe,
    index: &impl IndexFetcher,
    reporter: &impl ProgressReporter,
) -> Result<ResolvedArtifact, ResolveError> {
    let mut attempted = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        reporter.step(&format!("looking for Ubuntu {}...", candidate.label()));
        if let Some(uri) = resolve_candidate(candidate, locator, probe, index).await {
            tracing::info!(version = %candidate.version, uri = %uri, "resolved root filesystem");
            reporter.success(&format!("found Ubuntu {}", candidate.label()));
            return Ok(ResolvedArtifact::from_candidate(candidate, &uri));
        }
        tracing::info!(version = %candidate.version, "no reachable root filesystem, trying older release");
        attempted.push(candidate.label());
    }
    Err(ResolveError::NoArtifactFound { attempted })
}

/// Try every base location of one candidate. `None` means skip the candidate.
async fn resolve_candidate(
    candidate: &ReleaseCandidate,
    locator: &ArtifactLocator,
    probe: &impl ArtifactProbe,
    index: &impl IndexFetcher,
) -> Option<Url> {
    for base in locator.base_locations(candidate) {
        let well_known = locator.well_known_uris(&base, candidate);
        if let Some(uri) = first_available(probe, well_known).await {
            return Some(uri);
        }

        let html = match index.fetch_index(&base).await {
            Ok(html) => html,
            Err(e) => {
                tracing::debug!(base = %base, error = %e, "index page unavailable");
                continue;
            }
        };
        let links = rootfs_links(&base, &html);
        tracing::debug!(base = %base, links = links.len(), "scraped index page");
        if let Some(uri) = first_available(probe, links).await {
            return Some(uri);
        }
    }
    None
}

/// Probe `uris` in order and return the first available one.
async fn first_available(
    probe: &impl ArtifactProbe,
    uris: impl IntoIterator<Item = Url>,
) -> Option<Url> {
    for uri in uris {
        match probe.probe(&uri).await {
            ProbeOutcome::Available { status } => {
                tracing::debug!(uri = %uri, status, "available");
                return Some(uri);
            }
            ProbeOutcome::Absent { status } => {
                tracing::debug!(uri = %uri, status, "absent");
            }
            ProbeOutcome::Unreachable { reason } => {
                tracing::debug!(uri = %uri, reason = %reason, "unreachable");
            }
        }
    }
    None
}
