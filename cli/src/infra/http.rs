//! HTTP infrastructure: implements `ArtifactProbe`, `IndexFetcher` and
//! `ArtifactDownloader` with `ureq` on blocking tasks.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use url::Url;

use crate::application::ports::{ArtifactDownloader, ArtifactProbe, IndexFetcher, ProbeOutcome};

const USER_AGENT: &str = concat!("wslstack/", env!("CARGO_PKG_VERSION"));

/// Index pages and checksum lists are small; anything larger is not a listing.
const INDEX_BODY_LIMIT: u64 = 4 * 1024 * 1024;

fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .user_agent(USER_AGENT)
        .timeout_connect(Duration::from_secs(15))
        .build()
}

/// Production HTTP client shared by the probe, index and download ports.
#[derive(Clone)]
pub struct UreqHttp {
    agent: ureq::Agent,
    quiet: bool,
}

impl UreqHttp {
    /// `quiet` hides the download progress bar.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            agent: agent(),
            quiet,
        }
    }
}

impl ArtifactProbe for UreqHttp {
    async fn probe(&self, uri: &Url) -> ProbeOutcome {
        let agent = self.agent.clone();
        let uri = uri.to_string();
        tokio::task::spawn_blocking(move || match agent.head(&uri).call() {
            Ok(resp) => ProbeOutcome::from_status(resp.status()),
            Err(ureq::Error::Status(code, _)) => ProbeOutcome::from_status(code),
            Err(ureq::Error::Transport(t)) => ProbeOutcome::Unreachable {
                reason: t.to_string(),
            },
        })
        .await
        .unwrap_or_else(|e| ProbeOutcome::Unreachable {
            reason: format!("probe task failed: {e}"),
        })
    }
}

impl IndexFetcher for UreqHttp {
    async fn fetch_index(&self, uri: &Url) -> Result<String> {
        let agent = self.agent.clone();
        let uri = uri.to_string();
        tokio::task::spawn_blocking(move || {
            let resp = match agent.get(&uri).call() {
                Ok(r) => r,
                Err(ureq::Error::Status(code, _)) => anyhow::bail!("{uri}: HTTP {code}"),
                Err(e) => anyhow::bail!("{uri}: {e}"),
            };
            let mut body = String::new();
            resp.into_reader()
                .take(INDEX_BODY_LIMIT)
                .read_to_string(&mut body)
                .with_context(|| format!("reading {uri}"))?;
            Ok(body)
        })
        .await
        .context("index fetch task panicked")?
    }
}

impl ArtifactDownloader for UreqHttp {
    async fn download(&self, uri: &str, dest: &Path) -> Result<()> {
        let agent = self.agent.clone();
        let uri = uri.to_string();
        let dest = dest.to_path_buf();
        let quiet = self.quiet;
        tokio::task::spawn_blocking(move || download_with_resume(&agent, &uri, &dest, quiet))
            .await
            .context("download task panicked")?
    }
}

// ── Download ─────────────────────────────────────────────────────────────────

fn partial_path(dest: &Path) -> PathBuf {
    let mut s = dest.as_os_str().to_owned();
    s.push(".partial");
    PathBuf::from(s)
}

fn download_with_resume(agent: &ureq::Agent, url: &str, dest: &Path, quiet: bool) -> Result<()> {
    let partial = partial_path(dest);
    let existing = partial.metadata().map(|m| m.len()).unwrap_or(0);
    if existing > 0 {
        tracing::info!(bytes = existing, "resuming partial download");
    }
    do_download(agent, url, dest, &partial, existing, quiet, true)
}

#[allow(clippy::too_many_arguments)]
fn do_download(
    agent: &ureq::Agent,
    url: &str,
    dest: &Path,
    partial: &Path,
    existing: u64,
    quiet: bool,
    allow_retry: bool,
) -> Result<()> {
    let req = agent.get(url);
    let req = if existing > 0 {
        req.set("Range", &format!("bytes={existing}-"))
    } else {
        req
    };

    let response = match req.call() {
        Ok(r) => r,
        Err(ureq::Error::Status(416, _)) if allow_retry => {
            std::fs::remove_file(partial).ok();
            return do_download(agent, url, dest, partial, 0, quiet, false);
        }
        Err(ureq::Error::Status(code, _)) => anyhow::bail!("Download failed: HTTP {code}"),
        Err(e) => anyhow::bail!("Download interrupted: {e}\n\nResume with: wslstack provision"),
    };

    let status = response.status();
    let (mut file, start_pos) = open_partial_file(status, partial, existing)?;

    let total = response
        .header("Content-Length")
        .and_then(|v| v.parse::<u64>().ok())
        .map(|len| if status == 206 { start_pos + len } else { len });

    let pb = make_progress_bar(quiet, total, start_pos);

    let mut reader = response.into_reader();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf).context("Download interrupted")?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).context("Download interrupted")?;
        pb.inc(n as u64);
    }
    pb.finish_and_clear();
    file.flush().context("flushing download")?;
    drop(file);
    std::fs::rename(partial, dest)
        .with_context(|| format!("finalizing {}", dest.display()))?;
    Ok(())
}

fn open_partial_file(status: u16, partial: &Path, existing: u64) -> Result<(File, u64)> {
    match status {
        206 => {
            let file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(partial)
                .context("opening partial file")?;
            Ok((file, existing))
        }
        200 => {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(partial)
                .context("opening partial file")?;
            Ok((file, 0))
        }
        _ => anyhow::bail!("Download failed: HTTP {status}"),
    }
}

fn make_progress_bar(quiet: bool, total: Option<u64>, start_pos: u64) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::with_draw_target(total, ProgressDrawTarget::stderr());
    let style = match total {
        Some(_) => ProgressStyle::default_bar()
            .template("  {msg}\n    {bar:40.cyan/dim} {percent}%  {bytes}/{total_bytes}  eta {eta}")
            .map(|s| s.progress_chars("━━─")),
        None => ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}  {bytes} ({bytes_per_sec})"),
    };
    if let Ok(style) = style {
        pb.set_style(style);
    }
    pb.set_message("downloading root filesystem");
    if total.is_none() {
        pb.enable_steady_tick(Duration::from_millis(80));
    }
    pb.set_position(start_pos);
    pb
}
