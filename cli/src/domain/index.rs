//! Directory-listing link extraction.
//!
//! Pulls `href` targets out of an HTML index page, keeps the ones that look
//! like a root filesystem archive, and resolves them against the page URL.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::domain::provision::classify_archive;
use crate::domain::release::PACKED_IMAGE_SUFFIX;

#[allow(clippy::expect_used)] // Compile-time constant pattern
static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#).expect("valid regex")
});

/// Returns `true` when a link target names an importable root filesystem:
/// a `rootfs` tarball (`.tar`, `.tar.gz`, `.tgz`, `.tar.xz`) or a packed
/// `.wsl` image. Manifests and other side files next to the tarball are not.
#[must_use]
pub fn is_rootfs_link(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    if path.ends_with(PACKED_IMAGE_SUFFIX) {
        return true;
    }
    let file_name = path.rsplit('/').next().unwrap_or_default();
    path.contains("rootfs") && classify_archive(file_name).is_some()
}

/// Raw `href` targets in document order.
#[must_use]
pub fn extract_hrefs(html: &str) -> Vec<&str> {
    HREF.captures_iter(html)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Matching links from `html`, resolved against `page` and deduplicated on
/// the absolute URL string. Discovery order is kept.
#[must_use]
pub fn rootfs_links(page: &Url, html: &str) -> Vec<Url> {
    let mut seen = HashSet::new();
    extract_hrefs(html)
        .into_iter()
        .filter(|href| is_rootfs_link(href))
        .filter_map(|href| page.join(href).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .filter(|url| seen.insert(url.to_string()))
        .collect()
}
