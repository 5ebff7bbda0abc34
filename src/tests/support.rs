use crate::balancer::{Candidate, PartitionId, ReassignmentLayout, TopicsToMove};
use crate::config::{BalanceSettings, BalancerConfig};
use crate::executor::{CommandOutput, CommandRunner};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Mutex;

/// Scripted stand-in for the broker host and the reassignment tool.
///
/// `--generate` answers with every partition 0..6 of the requested topics,
/// replicas rotated over brokers 1..=3. `--verify` reports on the partitions
/// of the last reassignment file written.
#[derive(Default)]
pub(super) struct FakeRunner {
    pub commands: Mutex<Vec<String>>,
    pub files: Mutex<HashMap<String, String>>,
    /// `(pattern, stdout)`; the first pattern contained in the command wins.
    responses: Vec<(String, Vec<String>)>,
    /// Commands containing this pattern write to stderr.
    failing_pattern: Option<String>,
    /// Verify polls per round that report everything still in progress.
    in_progress_polls: usize,
    /// Partitions that end up failed.
    failing: Vec<String>,
    verify_calls: Mutex<usize>,
    last_reassignment: Mutex<Option<String>>,
}

impl FakeRunner {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn respond(mut self, pattern: &str, stdout: Vec<String>) -> Self {
        self.responses.push((pattern.to_string(), stdout));
        self
    }

    pub(super) fn fail_on(mut self, pattern: &str) -> Self {
        self.failing_pattern = Some(pattern.to_string());
        self
    }

    pub(super) fn in_progress_polls(mut self, polls: usize) -> Self {
        self.in_progress_polls = polls;
        self
    }

    pub(super) fn failing(mut self, partitions: &[&str]) -> Self {
        self.failing = partitions.iter().map(ToString::to_string).collect();
        self
    }

    pub(super) fn commands_containing(&self, pattern: &str) -> usize {
        self.commands.lock().unwrap().iter().filter(|c| c.contains(pattern)).count()
    }

    /// Every reassignment instruction written, in round order.
    pub(super) fn instructions(&self) -> Vec<ReassignmentLayout> {
        let files = self.files.lock().unwrap();
        let mut paths: Vec<&String> = files.keys().filter(|p| p.contains("reassignment-")).collect();
        paths.sort_by_key(|p| round_of(p));
        paths.into_iter().map(|p| serde_json::from_str(&files[p]).unwrap()).collect()
    }

    fn generate_output(&self) -> Vec<String> {
        let files = self.files.lock().unwrap();
        let request = files.iter().find(|(p, _)| p.contains("topicsToMove")).map(|(_, c)| c);
        let topics: TopicsToMove = serde_json::from_str(request.unwrap()).unwrap();

        let mut current = Vec::new();
        let mut proposed = Vec::new();
        for entry in &topics.topics {
            for p in 0..6u32 {
                let replicas: Vec<u32> = (0..3).map(|i| (p + i) % 3 + 1).collect();
                current.push(serde_json::json!({
                    "topic": entry.topic, "partition": p, "replicas": [1, 2, 3]
                }));
                proposed.push(serde_json::json!({
                    "topic": entry.topic, "partition": p, "replicas": replicas,
                    "log_dirs": ["any", "any", "any"]
                }));
            }
        }

        vec![
            "Current partition replica assignment".to_string(),
            serde_json::json!({ "version": 1, "partitions": current }).to_string(),
            "Proposed partition reassignment configuration".to_string(),
            serde_json::json!({ "version": 1, "partitions": proposed }).to_string(),
        ]
    }

    fn verify_output(&self) -> Vec<String> {
        let path = self.last_reassignment.lock().unwrap().clone().unwrap();
        let layout: ReassignmentLayout =
            serde_json::from_str(&self.files.lock().unwrap()[&path]).unwrap();

        let mut calls = self.verify_calls.lock().unwrap();
        *calls += 1;
        let settled = *calls > self.in_progress_polls;

        let mut lines = vec!["Status of partition reassignment:".to_string()];
        for record in &layout.partitions {
            let name = record.partition_id().to_string();
            let status = if !settled {
                "is still in progress"
            } else if self.failing.contains(&name) {
                "failed"
            } else {
                "completed successfully"
            };
            lines.push(format!("Reassignment of partition {name} {status}"));
        }
        lines.push("Replica movement status:".to_string());
        lines
    }
}

fn round_of(path: &str) -> u32 {
    path.rsplit_once("-r").and_then(|(_, r)| r.trim_end_matches(".json").parse().ok()).unwrap()
}

impl CommandRunner for FakeRunner {
    async fn run(&self, command: &str) -> Result<CommandOutput> {
        self.commands.lock().unwrap().push(command.to_string());

        if self.failing_pattern.as_deref().is_some_and(|p| command.contains(p)) {
            return Ok(CommandOutput {
                stdout: vec![],
                stderr: vec!["Error: boom".to_string()],
                success: false,
            });
        }

        let scripted = self.responses.iter().find(|(p, _)| command.contains(p.as_str()));
        let stdout = if let Some((_, out)) = scripted {
            out.clone()
        } else if command.contains("--generate") {
            self.generate_output()
        } else if command.contains("--verify") {
            self.verify_output()
        } else {
            vec![]
        };

        Ok(CommandOutput { stdout, stderr: vec![], success: true })
    }

    async fn write_file(&self, path: &str, contents: &str) -> Result<()> {
        self.commands.lock().unwrap().push(format!("write {path}"));
        if path.contains("reassignment-") {
            *self.verify_calls.lock().unwrap() = 0;
            *self.last_reassignment.lock().unwrap() = Some(path.to_string());
        }
        self.files.lock().unwrap().insert(path.to_string(), contents.to_string());
        Ok(())
    }
}

pub(super) fn test_config() -> BalancerConfig {
    BalancerConfig {
        host: Some("kb-002.example.com".to_string()),
        broker_id: Some(2),
        zookeeper_connect: "zk-{env}-001:2181".to_string(),
        bootstrap_servers: "kb-{env}-001:9093".to_string(),
        environment_tag: "d".to_string(),
        poll_interval_ms: 0,
        ..BalancerConfig::default()
    }
}

pub(super) fn test_settings() -> BalanceSettings {
    test_config().settings().unwrap()
}

pub(super) fn candidate(size: u64, name: &str) -> Candidate {
    Candidate::new(size, name.parse::<PartitionId>().unwrap())
}

/// The four-volume broker: kafka3 at 80%, the rest around 22-25%.
pub(super) fn df_report() -> Vec<String> {
    vec![
        "2128439787520  474803814400 1556468125696 /data/kafka1".to_string(),
        "2128439787520  538838528000 1492433412096 /data/kafka2".to_string(),
        "2128439787520 1702751830016  425687957504 /data/kafka3".to_string(),
        "2128439787520  538838528000 1492433412096 /data/kafka4".to_string(),
    ]
}

/// `du` output for kafka3's data directory.
pub(super) fn du_report() -> Vec<String> {
    [
        (125_000_000_000u64, "testTopic-1"),
        (125_000_000_000, "testTopic-2"),
        (50_000_000_000, "testTopic-3"),
        (125_000_000_000, "testTopic-4"),
        (62_500_000_000, "testTopic-5"),
        (31_250_000_000, "testTopic1-0"),
        (31_250_000_000, "testTopic1-1"),
        (62_500_000_000, "testTopic1-2"),
        (62_500_000_000, "testTopic1-3"),
        (31_250_000_000, "testTopic2-0"),
        (15_625_000_000, "testTopic-0"),
        (15_625_000_000, "testTopic2-1"),
        (15_625_000_000, "testTopic2-2"),
        (15_625_000_000, "testTopic2-3"),
        (15_625_000_000, "testTopic2-4"),
        (15_625_000_000, "testTopic3-0"),
    ]
    .iter()
    .map(|(size, name)| format!("{size}\t{name}"))
    .collect()
}
