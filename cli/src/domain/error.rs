//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Resolution errors ─────────────────────────────────────────────────────────

/// Errors surfaced by release/artifact resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Every candidate and every URL pattern was exhausted.
    #[error("{}", no_artifact_message(.attempted))]
    NoArtifactFound { attempted: Vec<String> },
}

fn no_artifact_message(attempted: &[String]) -> String {
    if attempted.is_empty() {
        "No downloadable root filesystem found: no releases configured.\n\nAdd releases to the config file or drop --release filters.".to_string()
    } else {
        format!(
            "No downloadable root filesystem found.\n\nTried: {}\nCheck network access or the mirror settings (wslstack config show).",
            attempted.join(", ")
        )
    }
}

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Errors raised by the provisioning steps that shell out to external tools.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("{step} failed (exit code {code}): {stderr}")]
    StepFailed {
        step: String,
        code: i32,
        stderr: String,
    },

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Unsupported archive format: {0}\n\nExpected .tar, .tar.gz, .tgz, .tar.xz or .wsl")]
    UnsupportedArchive(String),

    #[error("Cannot derive a file name from {0}")]
    NoFileName(String),

    #[error("wsl.exe not found. Install WSL first: wsl --install --no-distribution")]
    WslUnavailable,
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },

    #[error("Unknown release: {0}")]
    UnknownRelease(String),
}
