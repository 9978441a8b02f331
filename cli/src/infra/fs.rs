//! Filesystem infrastructure: implements `FileHasher`, `LocalFs` and `LocalPaths`.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Production filesystem implementation.
///
/// `cache_dir` overrides the cache location. `install_root` replaces the
/// parent of per-distribution install directories; each distribution still
/// gets its own `<install_root>/<name>`.
#[derive(Default)]
pub struct LocalFs {
    cache_dir: Option<PathBuf>,
    install_root: Option<PathBuf>,
}

impl LocalFs {
    #[must_use]
    pub fn new(cache_dir: Option<PathBuf>, install_root: Option<PathBuf>) -> Self {
        Self {
            cache_dir,
            install_root,
        }
    }
}

impl crate::application::ports::FileHasher for LocalFs {
    fn sha256_file(&self, path: &Path) -> Result<String> {
        sha256_file(path)
    }
}

impl crate::application::ports::LocalPaths for LocalFs {
    fn cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(data_dir()?.join("cache")),
        }
    }

    fn install_dir(&self, name: &str) -> Result<PathBuf> {
        let root = match &self.install_root {
            Some(dir) => dir.clone(),
            None => data_dir()?.join("distros"),
        };
        Ok(root.join(name))
    }
}

impl crate::application::ports::LocalFs for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("creating directory {}", path.display()))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path).with_context(|| format!("removing file {}", path.display()))
    }
}

/// `<data_local_dir>/wslstack`.
fn data_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|d| d.join("wslstack"))
        .ok_or_else(|| anyhow::anyhow!("cannot determine local data directory"))
}

/// Lowercase hex encoding.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

/// Compute the SHA256 hex digest of a file.
///
/// Reads the file in 64 KB chunks to avoid loading large files into memory.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading file")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}
