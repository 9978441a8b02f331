//! `wsl.exe` infrastructure: implements `DistroManager` and a
//! `ShellExecutor` that runs commands as root inside a distribution.

use std::process::Output;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, DistroManager, ImportSpec, ShellExecutor};
use crate::domain::provision::{
    decode_wsl_output, parse_distro_list, wsl_reports_no_distributions,
};
use crate::infra::command_runner::LONG_CMD_TIMEOUT;

/// Windows-side WSL launcher, reachable from Windows and from inside WSL.
pub const WSL_EXE: &str = "wsl.exe";

/// Distribution management through `wsl.exe`.
pub struct WslCli<'a, R> {
    runner: &'a R,
}

impl<'a, R: CommandRunner> WslCli<'a, R> {
    #[must_use]
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> DistroManager for WslCli<'_, R> {
    async fn list(&self) -> Result<Vec<String>> {
        let output = self
            .runner
            .run(WSL_EXE, &["--list", "--quiet"])
            .await
            .context("wsl.exe not available")?;
        if !output.status.success() {
            let text = format!(
                "{}{}",
                decode_wsl_output(&output.stdout),
                decode_wsl_output(&output.stderr)
            );
            tracing::debug!(status = ?output.status.code(), %text, "wsl --list failed");
            if wsl_reports_no_distributions(&text) {
                return Ok(Vec::new());
            }
            anyhow::bail!(
                "wsl --list exited with {}: {}",
                output.status.code().unwrap_or(-1),
                text.trim()
            );
        }
        Ok(parse_distro_list(&output.stdout))
    }

    async fn import(&self, spec: &ImportSpec<'_>) -> Result<Output> {
        let install_dir = spec.install_dir.to_string_lossy();
        let tarball = spec.tarball.to_string_lossy();
        let version = spec.version.to_string();
        tracing::info!(distro = spec.name, %install_dir, %tarball, "wsl --import");
        let output = self
            .runner
            .run_with_timeout(
                WSL_EXE,
                &[
                    "--import",
                    spec.name,
                    &install_dir,
                    &tarball,
                    "--version",
                    &version,
                ],
                LONG_CMD_TIMEOUT,
            )
            .await?;
        Ok(decoded(output))
    }

    async fn unregister(&self, name: &str) -> Result<Output> {
        tracing::info!(distro = name, "wsl --unregister");
        let output = self
            .runner
            .run_with_timeout(WSL_EXE, &["--unregister", name], LONG_CMD_TIMEOUT)
            .await?;
        Ok(decoded(output))
    }

    async fn terminate(&self, name: &str) -> Result<Output> {
        let output = self.runner.run(WSL_EXE, &["--terminate", name]).await?;
        Ok(decoded(output))
    }
}

/// `wsl.exe` reports its own errors in UTF-16; re-encode them so callers can
/// treat stderr as UTF-8 like any other tool.
fn decoded(mut output: Output) -> Output {
    output.stdout = decode_wsl_output(&output.stdout).into_bytes();
    output.stderr = decode_wsl_output(&output.stderr).into_bytes();
    output
}

/// Runs commands as root inside the named distribution.
pub struct WslShell<'a, R> {
    runner: &'a R,
    name: String,
}

impl<'a, R: CommandRunner> WslShell<'a, R> {
    #[must_use]
    pub fn new(runner: &'a R, name: impl Into<String>) -> Self {
        Self {
            runner,
            name: name.into(),
        }
    }

    fn argv<'s>(&'s self, args: &[&'s str]) -> Vec<&'s str> {
        let mut argv = vec!["-d", self.name.as_str(), "-u", "root", "--"];
        argv.extend_from_slice(args);
        argv
    }
}

impl<R: CommandRunner> ShellExecutor for WslShell<'_, R> {
    async fn exec(&self, args: &[&str]) -> Result<Output> {
        self.runner
            .run_with_timeout(WSL_EXE, &self.argv(args), LONG_CMD_TIMEOUT)
            .await
    }

    async fn exec_with_stdin(&self, args: &[&str], input: &[u8]) -> Result<Output> {
        self.runner
            .run_with_stdin(WSL_EXE, &self.argv(args), input)
            .await
    }
}
