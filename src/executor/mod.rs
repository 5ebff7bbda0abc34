mod reassign;
mod verify;

pub(crate) use reassign::ReassignTool;
pub(crate) use verify::{tally_statuses, VerifyTally};

#[cfg(test)]
pub(crate) use reassign::parse_proposed_layout;
#[cfg(test)]
pub(crate) use verify::{classify_line, PartitionStatus};

use crate::error::BalanceError;
use anyhow::{Context, Result};
use regex::Regex;
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::Command;
use tracing::debug;

/// Terminal colouring and cursor-control sequences.
static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\x9B|\x1B\[)[0-?]*[ -/]*[@-~]").unwrap());

/// Lines captured from one remote command.
#[derive(Debug, Clone, Default)]
pub(crate) struct CommandOutput {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub success: bool,
}

/// Runs one command at a time on the broker host.
pub(crate) trait CommandRunner {
    async fn run(&self, command: &str) -> Result<CommandOutput>;

    /// Run `command` and return its stdout lines.
    ///
    /// Any stderr output, or a non-zero exit, fails with [`BalanceError::Collaborator`].
    async fn execute(&self, command: &str) -> Result<Vec<String>> {
        let output = self.run(command).await?;
        if !output.stderr.is_empty() || !output.success {
            let stderr = if output.stderr.is_empty() {
                vec!["exited with non-zero status".to_string()]
            } else {
                output.stderr
            };
            return Err(BalanceError::Collaborator { command: command.to_string(), stderr }.into());
        }
        Ok(output.stdout)
    }

    /// Write `contents` to `path` on the remote host.
    async fn write_file(&self, path: &str, contents: &str) -> Result<()> {
        let command = format!("printf '%s\\n' {} > {}", shell_quote(contents), shell_quote(path));
        self.execute(&command).await.map(|_| ())
    }
}

/// Executes commands over the system `ssh` client, one connection per command.
#[derive(Debug, Clone)]
pub(crate) struct SshRunner {
    destination: String,
    run_as: Option<String>,
}

impl SshRunner {
    pub(crate) const fn new(destination: String, run_as: Option<String>) -> Self {
        Self { destination, run_as }
    }

    fn remote_command(&self, command: &str) -> String {
        match &self.run_as {
            Some(user) => {
                format!("sudo -iu {} -- bash -c {}", shell_quote(user), shell_quote(command))
            }
            None => command.to_string(),
        }
    }
}

impl CommandRunner for SshRunner {
    async fn run(&self, command: &str) -> Result<CommandOutput> {
        let remote = self.remote_command(command);
        debug!("ssh {}: {}", self.destination, remote);

        let output = Command::new("ssh")
            .args(["-o", "BatchMode=yes", "-o", "LogLevel=ERROR", "-T"])
            .arg(&self.destination)
            .arg("--")
            .arg(&remote)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to spawn ssh to {}", self.destination))?;

        Ok(CommandOutput {
            stdout: clean_lines(&String::from_utf8_lossy(&output.stdout)),
            stderr: clean_lines(&String::from_utf8_lossy(&output.stderr)),
            success: output.status.success(),
        })
    }
}

/// Strip terminal control sequences, backspaces and carriage returns; drop blank lines.
pub(crate) fn clean_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| ANSI_RE.replace_all(line, "").replace(['\u{8}', '\r'], ""))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// POSIX single-quote `s` for a shell command line.
pub(crate) fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
