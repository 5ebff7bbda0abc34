use super::{shell_quote, CommandRunner};
use crate::balancer::{ReassignmentLayout, TopicsToMove};
use crate::config::ToolSettings;
use crate::error::BalanceError;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Header the tool prints right before the proposed layout.
const PROPOSED_HEADER: &str = "Proposed partition reassignment configuration";

/// Drives the external partition reassignment tool through generate, execute and verify.
pub(crate) struct ReassignTool<'a, R> {
    runner: &'a R,
    settings: &'a ToolSettings,
}

impl<'a, R: CommandRunner> ReassignTool<'a, R> {
    pub(crate) const fn new(runner: &'a R, settings: &'a ToolSettings) -> Self {
        Self { runner, settings }
    }

    pub(crate) fn generate_command(&self, topics_file: &str) -> String {
        format!(
            "{} --zookeeper {} --topics-to-move-json-file {} --broker-list {} --generate",
            self.settings.bin,
            self.settings.zookeeper_connect,
            shell_quote(topics_file),
            self.settings.broker_list
        )
    }

    /// Shared prefix of the execute and verify invocations.
    fn reassignment_command(&self, reassignment_file: &str, action: &str) -> String {
        let mut command =
            format!("{} --zookeeper {}", self.settings.bin, self.settings.zookeeper_connect);
        if let Some(cfg) = &self.settings.command_config {
            command.push_str(&format!(" --command-config {}", shell_quote(cfg)));
        }
        command.push_str(&format!(
            " --reassignment-json-file {} --bootstrap-server {} {action}",
            shell_quote(reassignment_file),
            self.settings.bootstrap_servers
        ));
        command
    }

    pub(crate) fn execute_command(&self, reassignment_file: &str) -> String {
        self.reassignment_command(reassignment_file, "--execute")
    }

    pub(crate) fn verify_command(&self, reassignment_file: &str) -> String {
        self.reassignment_command(reassignment_file, "--verify")
    }

    /// Write the topics request to `topics_file` and ask the tool for a candidate layout.
    pub(crate) async fn generate(
        &self,
        topics_file: &str,
        topics: &TopicsToMove,
    ) -> Result<ReassignmentLayout> {
        let payload = serde_json::to_string_pretty(topics)?;
        self.runner.write_file(topics_file, &payload).await?;
        debug!("Topics to move written to {}:\n{}", topics_file, payload);

        let stdout = self.runner.execute(&self.generate_command(topics_file)).await?;
        Ok(parse_proposed_layout(&stdout)?)
    }

    /// Write the final instruction to `reassignment_file` and submit it.
    pub(crate) async fn execute(
        &self,
        reassignment_file: &str,
        layout: &ReassignmentLayout,
    ) -> Result<()> {
        let payload = serde_json::to_string(layout)?;
        self.runner
            .write_file(reassignment_file, &payload)
            .await
            .with_context(|| format!("Failed to write {reassignment_file}"))?;
        info!("Submitting reassignment {}", reassignment_file);
        self.runner.execute(&self.execute_command(reassignment_file)).await?;
        Ok(())
    }

    /// One verification pass; returns the tool's raw status lines.
    pub(crate) async fn verify(&self, reassignment_file: &str) -> Result<Vec<String>> {
        self.runner.execute(&self.verify_command(reassignment_file)).await
    }
}

/// Pull the proposed layout out of the generate step's output.
///
/// The tool prints the current layout first and the proposed one after
/// [`PROPOSED_HEADER`]. Without the header, the last line that parses as a
/// layout is taken.
pub(crate) fn parse_proposed_layout(lines: &[String]) -> Result<ReassignmentLayout, BalanceError> {
    let parse = |line: &String| -> Option<ReassignmentLayout> {
        let line = line.trim();
        if !line.starts_with('{') {
            return None;
        }
        serde_json::from_str(line).ok()
    };

    if let Some(header) = lines.iter().position(|l| l.contains(PROPOSED_HEADER)) {
        if let Some(layout) = lines[header + 1..].iter().find_map(parse) {
            return Ok(layout);
        }
    }

    lines.iter().rev().find_map(parse).ok_or(BalanceError::MissingProposedLayout)
}
