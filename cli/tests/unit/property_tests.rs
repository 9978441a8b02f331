//! Property-based tests for link extraction, release filtering, and probe
//! classification.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used)]

use proptest::prelude::*;
use url::Url;

use wslstack_cli::application::ports::ProbeOutcome;
use wslstack_cli::domain::config::{VALID_CONFIG_KEYS, validate_config_key, validate_config_value};
use wslstack_cli::domain::index::rootfs_links;
use wslstack_cli::domain::provision::checksum_for;
use wslstack_cli::domain::release::{ReleaseCandidate, default_candidates, filter_candidates};

fn page() -> Url {
    Url::parse("https://cloud-images.ubuntu.com/wsl/noble/current/").expect("valid url")
}

// ============================================================================
// rootfs_links()
// ============================================================================

fn href() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9.-]{1,12}\\.rootfs\\.tar\\.gz",
        "\\./[a-z]{1,8}-rootfs\\.tar\\.xz",
        "\\.\\./[a-z]{1,8}/ubuntu\\.wsl",
        "https://mirror\\.example/[a-z]{1,8}\\.rootfs\\.tar",
        "ftp://mirror\\.example/[a-z]{1,8}\\.rootfs\\.tar",
        "javascript:rootfs",
        "[A-Z]{1,10}\\.txt",
    ]
}

proptest! {
    /// Links are absolute http(s) URLs, unique, and each names a root filesystem.
    #[test]
    fn prop_links_are_unique_absolute_and_http(hrefs in prop::collection::vec(href(), 0..24)) {
        let html: String = hrefs.iter().map(|h| format!("<a href=\"{h}\">x</a>\n")).collect();
        let links = rootfs_links(&page(), &html);

        let mut seen = std::collections::HashSet::new();
        for link in &links {
            prop_assert!(matches!(link.scheme(), "http" | "https"), "bad scheme: {link}");
            prop_assert!(seen.insert(link.to_string()), "duplicate: {link}");
            let lower = link.path().to_ascii_lowercase();
            prop_assert!(lower.contains("rootfs") || lower.ends_with(".wsl"), "not a rootfs: {link}");
        }
    }

    /// Every link keeps the position of its first occurrence in the page.
    #[test]
    fn prop_links_keep_discovery_order(names in prop::collection::vec("[a-z]{1,6}", 1..12)) {
        let html: String = names
            .iter()
            .map(|n| format!("<a href='{n}.rootfs.tar.gz'>{n}</a>"))
            .collect();
        let links = rootfs_links(&page(), &html);

        let mut expected: Vec<String> = Vec::new();
        for n in &names {
            let url = format!("{}{n}.rootfs.tar.gz", page());
            if !expected.contains(&url) {
                expected.push(url);
            }
        }
        let actual: Vec<String> = links.iter().map(ToString::to_string).collect();
        prop_assert_eq!(actual, expected);
    }
}

// ============================================================================
// filter_candidates()
// ============================================================================

proptest! {
    /// Any subset of known versions comes back in the original newest-first order.
    #[test]
    fn prop_filter_preserves_candidate_order(mask in prop::collection::vec(any::<bool>(), 4)) {
        let all = default_candidates();
        let mut wanted: Vec<String> = all
            .iter()
            .zip(mask.iter().cycle())
            .filter(|(_, keep)| **keep)
            .map(|(c, _)| c.version.clone())
            .collect();
        wanted.reverse();

        let kept = filter_candidates(&all, &wanted).expect("known versions");
        let expected: Vec<ReleaseCandidate> = if wanted.is_empty() {
            all.clone()
        } else {
            all.iter().filter(|c| wanted.contains(&c.version)).cloned().collect()
        };
        prop_assert_eq!(kept, expected);
    }

    /// Versions nobody ships are rejected by name.
    #[test]
    fn prop_unknown_versions_rejected(major in 30u32..99, minor in 0u32..12) {
        let version = format!("{major}.{minor:02}");
        let err = filter_candidates(&default_candidates(), std::slice::from_ref(&version));
        prop_assert_eq!(err, Err(version));
    }
}

// ============================================================================
// ProbeOutcome::from_status()
// ============================================================================

proptest! {
    /// Only 2xx and 3xx count as available.
    #[test]
    fn prop_probe_availability_matches_status_class(status in 100u16..600) {
        let outcome = ProbeOutcome::from_status(status);
        prop_assert_eq!(outcome.is_available(), (200..400).contains(&status));
    }
}

// ============================================================================
// checksum_for() and config validation
// ============================================================================

proptest! {
    /// A well-formed line is found regardless of the binary-mode marker.
    #[test]
    fn prop_checksum_found_for_listed_file(
        hex in "[0-9a-f]{64}",
        name in "[a-z0-9.-]{1,30}",
        binary in any::<bool>(),
    ) {
        let line = if binary { format!("{hex} *{name}") } else { format!("{hex}  {name}") };
        let sums = format!("{}  OTHER.tar\n{line}\n", "0".repeat(64));
        prop_assert_eq!(checksum_for(&sums, &name), Some(hex));
    }

    /// Arbitrary dotted keys outside the whitelist are rejected.
    #[test]
    fn prop_arbitrary_keys_rejected(key in "[a-z]{1,12}\\.[a-z]{1,12}") {
        if !VALID_CONFIG_KEYS.contains(&key.as_str()) {
            prop_assert!(validate_config_key(&key).is_err(), "accepted invalid key: {key}");
        }
    }

    /// Distribution names with whitespace never validate.
    #[test]
    fn prop_distro_name_with_space_rejected(a in "[a-z]{1,10}", b in "[a-z]{1,10}") {
        let name = format!("{a} {b}");
        prop_assert!(validate_config_value("distro.name", &name).is_err());
    }
}
