//! Command implementations

pub mod config;
pub mod host;
pub mod provision;
pub mod resolve;
pub mod status;
pub mod version;

use anyhow::Result;

use crate::domain::error::ConfigError;
use crate::domain::release::{ReleaseCandidate, filter_candidates};
use crate::domain::StackConfig;

/// Configured release candidates, narrowed to `--release` filters when given.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownRelease`] for a filter that matches no candidate.
pub fn selected_releases(config: &StackConfig, filters: &[String]) -> Result<Vec<ReleaseCandidate>> {
    filter_candidates(&config.releases, filters)
        .map_err(|unknown| ConfigError::UnknownRelease(unknown).into())
}
