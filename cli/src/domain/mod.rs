//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod index;
pub mod provision;
pub mod release;

pub use config::{StackConfig, validate_config_key, validate_config_value};
pub use error::{ConfigError, ProvisionError, ResolveError};
pub use provision::{ContainerState, ProvisionRecord};
pub use release::{ArtifactLocator, ReleaseCandidate, ResolvedArtifact};
