//! wslstack - Ubuntu on WSL with a container runtime, provisioned in one command

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wslstack_cli::cli::Cli;
use wslstack_cli::output::json::format_error;

/// Environment variable holding a full `tracing` filter directive.
const LOG_ENV: &str = "WSLSTACK_LOG";

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json = cli.json;
    if let Err(e) = cli.run().await {
        if json {
            match format_error(&format!("{e:#}"), error_code(&e)) {
                Ok(obj) => println!("{obj}"),
                Err(_) => eprintln!("Error: {e:#}"),
            }
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}

/// Stable machine-readable code for the `--json` error object.
fn error_code(e: &anyhow::Error) -> &'static str {
    use wslstack_cli::domain::{ConfigError, ProvisionError, ResolveError};
    if e.downcast_ref::<ResolveError>().is_some() {
        "NO_ARTIFACT_FOUND"
    } else if let Some(p) = e.downcast_ref::<ProvisionError>() {
        match p {
            ProvisionError::StepFailed { .. } => "STEP_FAILED",
            ProvisionError::ChecksumMismatch { .. } => "CHECKSUM_MISMATCH",
            ProvisionError::UnsupportedArchive(_) | ProvisionError::NoFileName(_) => {
                "UNSUPPORTED_ARTIFACT"
            }
            ProvisionError::WslUnavailable => "WSL_UNAVAILABLE",
        }
    } else if e.downcast_ref::<ConfigError>().is_some() {
        "INVALID_CONFIG"
    } else {
        "ERROR"
    }
}
