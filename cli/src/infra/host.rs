//! Host shell: implements `ShellExecutor` by running commands directly.

use std::process::Output;

use anyhow::Result;

use crate::application::ports::{CommandRunner, ShellExecutor};
use crate::infra::command_runner::LONG_CMD_TIMEOUT;

/// Runs `args[0]` with `args[1..]` on the local machine.
pub struct HostShell<'a, R> {
    runner: &'a R,
}

impl<'a, R: CommandRunner> HostShell<'a, R> {
    #[must_use]
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> ShellExecutor for HostShell<'_, R> {
    async fn exec(&self, args: &[&str]) -> Result<Output> {
        let Some((program, rest)) = args.split_first() else {
            anyhow::bail!("empty command line");
        };
        self.runner
            .run_with_timeout(program, rest, LONG_CMD_TIMEOUT)
            .await
    }

    async fn exec_with_stdin(&self, args: &[&str], input: &[u8]) -> Result<Output> {
        let Some((program, rest)) = args.split_first() else {
            anyhow::bail!("empty command line");
        };
        self.runner.run_with_stdin(program, rest, input).await
    }
}
