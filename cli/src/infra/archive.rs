//! Archive infrastructure: implements `ArchiveExpander`.
//!
//! gzip is handled in-process with `flate2`. xz is streamed through the
//! external `xz` tool. Output is written to `<dest>.partial` and renamed so an
//! interrupted run never leaves a truncated tarball behind.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

use crate::application::ports::ArchiveExpander;
use crate::domain::provision::ArchiveKind;

/// Production `ArchiveExpander`.
pub struct LocalArchiveExpander;

impl ArchiveExpander for LocalArchiveExpander {
    async fn expand(&self, kind: ArchiveKind, src: &Path, dest: &Path) -> Result<()> {
        let src = src.to_path_buf();
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || expand_sync(kind, &src, &dest))
            .await
            .context("decompression task panicked")?
    }

    async fn verify_tarball(&self, path: &Path) -> Result<()> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || verify_tarball_sync(&path))
            .await
            .context("tarball check task panicked")?
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut s = dest.as_os_str().to_owned();
    s.push(".partial");
    PathBuf::from(s)
}

fn expand_sync(kind: ArchiveKind, src: &Path, dest: &Path) -> Result<()> {
    if kind == ArchiveKind::Tar && src == dest {
        return Ok(());
    }
    let partial = partial_path(dest);
    let result = match kind {
        ArchiveKind::Gzip => gunzip(src, &partial),
        ArchiveKind::Xz => unxz(src, &partial),
        ArchiveKind::Tar => std::fs::copy(src, &partial)
            .map(|_| ())
            .with_context(|| format!("copying {}", src.display())),
    };
    if let Err(e) = result {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }
    std::fs::rename(&partial, dest).with_context(|| format!("finalizing {}", dest.display()))?;
    tracing::info!(src = %src.display(), dest = %dest.display(), ?kind, "archive expanded");
    Ok(())
}

fn gunzip(src: &Path, out: &Path) -> Result<()> {
    let input = File::open(src).with_context(|| format!("opening {}", src.display()))?;
    let mut decoder = flate2::read::MultiGzDecoder::new(BufReader::new(input));
    let output = File::create(out).with_context(|| format!("creating {}", out.display()))?;
    let mut writer = BufWriter::new(output);
    std::io::copy(&mut decoder, &mut writer)
        .with_context(|| format!("gunzip {}", src.display()))?;
    writer.flush().context("flushing tarball")?;
    Ok(())
}

fn unxz(src: &Path, out: &Path) -> Result<()> {
    let output = File::create(out).with_context(|| format!("creating {}", out.display()))?;
    let status = Command::new("xz")
        .arg("-dc")
        .arg(src)
        .stdin(Stdio::null())
        .stdout(Stdio::from(output))
        .stderr(Stdio::inherit())
        .status()
        .context("failed to run xz (is it installed?)")?;
    anyhow::ensure!(status.success(), "xz exited with {status}");
    Ok(())
}

fn verify_tarball_sync(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut archive = tar::Archive::new(BufReader::new(file));
    let first = archive
        .entries()
        .with_context(|| format!("reading {}", path.display()))?
        .next();
    match first {
        Some(entry) => {
            entry.with_context(|| format!("{} is not a valid tar archive", path.display()))?;
            Ok(())
        }
        None => anyhow::bail!("{} is an empty tar archive", path.display()),
    }
}
