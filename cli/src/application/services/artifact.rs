//! Application service: root filesystem cache.
//!
//! Downloads the resolved archive unless cached, checks it against the
//! mirror's `SHA256SUMS` when one is published, and decompresses it into a
//! plain tarball unless that already exists.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use url::Url;

use crate::application::ports::{
    ArchiveExpander, ArtifactDownloader, FileHasher, IndexFetcher, LocalFs, ProgressReporter,
};
use crate::domain::error::ProvisionError;
use crate::domain::provision::{checksum_for, classify_archive};
use crate::domain::release::ResolvedArtifact;

/// Name of the checksum listing published next to cloud images.
pub const CHECKSUM_LIST: &str = "SHA256SUMS";

/// Local paths produced by [`ensure_tarball`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    /// The archive exactly as downloaded.
    pub archive: PathBuf,
    /// The uncompressed tarball handed to `wsl.exe --import`.
    pub tarball: PathBuf,
    /// `true` if this run downloaded the archive.
    pub downloaded: bool,
    /// `true` if this run decompressed the archive.
    pub expanded: bool,
}

/// Collaborators used by the cache step.
pub struct CachePorts<'a, D, I, H, E, F> {
    pub downloader: &'a D,
    pub index: &'a I,
    pub hasher: &'a H,
    pub expander: &'a E,
    pub fs: &'a F,
}

/// Make sure the artifact is downloaded and decompressed under `cache_dir`.
///
/// # Errors
///
/// Returns an error if the URL has no file name, the format is unsupported,
/// the download or decompression fails, or the checksum does not match.
pub async fn ensure_tarball<D, I, H, E, F>(
    artifact: &ResolvedArtifact,
    cache_dir: &Path,
    ports: &CachePorts<'_, D, I, H, E, F>,
    reporter: &impl ProgressReporter,
) -> Result<CachedArtifact>
where
    D: ArtifactDownloader,
    I: IndexFetcher,
    H: FileHasher,
    E: ArchiveExpander,
    F: LocalFs,
{
    let file_name = artifact
        .file_name()
        .ok_or_else(|| ProvisionError::NoFileName(artifact.rootfs_uri.clone()))?;
    let (kind, tar_name) = classify_archive(&file_name)
        .ok_or_else(|| ProvisionError::UnsupportedArchive(file_name.clone()))?;

    ports.fs.create_dir_all(cache_dir)?;
    let archive = cache_dir.join(&file_name);
    let tarball = cache_dir.join(&tar_name);

    let downloaded = if ports.fs.exists(&archive) {
        tracing::info!(path = %archive.display(), "archive already cached");
        false
    } else {
        reporter.step(&format!("downloading {file_name}..."));
        ports
            .downloader
            .download(&artifact.rootfs_uri, &archive)
            .await
            .with_context(|| format!("downloading {}", artifact.rootfs_uri))?;
        verify_checksum(artifact, &file_name, &archive, ports, reporter).await?;
        reporter.success(&format!("downloaded {file_name}"));
        true
    };

    let expanded = if ports.fs.exists(&tarball) {
        false
    } else {
        reporter.step(&format!("decompressing {file_name}..."));
        ports
            .expander
            .expand(kind, &archive, &tarball)
            .await
            .with_context(|| format!("decompressing {}", archive.display()))?;
        reporter.success(&format!("decompressed to {tar_name}"));
        true
    };

    ports.expander.verify_tarball(&tarball).await?;

    Ok(CachedArtifact {
        archive,
        tarball,
        downloaded,
        expanded,
    })
}

/// Compare the download against `SHA256SUMS` in the same directory. A missing
/// listing or a listing without this file only warns.
async fn verify_checksum<D, I, H, E, F>(
    artifact: &ResolvedArtifact,
    file_name: &str,
    archive: &Path,
    ports: &CachePorts<'_, D, I, H, E, F>,
    reporter: &impl ProgressReporter,
) -> Result<()>
where
    I: IndexFetcher,
    H: FileHasher,
    F: LocalFs,
{
    let sums_url = Url::parse(&artifact.rootfs_uri).and_then(|u| u.join(CHECKSUM_LIST));
    let expected = match sums_url {
        Ok(url) => match ports.index.fetch_index(&url).await {
            Ok(sums) => checksum_for(&sums, file_name),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "no checksum list");
                None
            }
        },
        Err(_) => None,
    };
    let Some(expected) = expected else {
        reporter.warn(&format!("no published checksum for {file_name}, skipping verification"));
        return Ok(());
    };

    let actual = ports.hasher.sha256_file(archive)?;
    if actual != expected {
        if let Err(e) = ports.fs.remove_file(archive) {
            tracing::warn!(
                file = %archive.display(),
                error = %e,
                "cannot remove archive that failed verification"
            );
            reporter.warn(&format!(
                "could not remove {}; delete it before retrying or it will be reused unverified",
                archive.display()
            ));
        }
        return Err(ProvisionError::ChecksumMismatch {
            file: file_name.to_string(),
            expected,
            actual,
        }
        .into());
    }
    tracing::info!(file = file_name, "checksum verified");
    Ok(())
}
