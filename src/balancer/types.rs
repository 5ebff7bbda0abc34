use crate::error::BalanceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A topic partition as named on disk and on the reassignment tool's wire: `<topic>-<index>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct PartitionId {
    pub topic: String,
    pub index: u32,
}

impl PartitionId {
    pub(crate) fn new(topic: impl Into<String>, index: u32) -> Self {
        Self { topic: topic.into(), index }
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.topic, self.index)
    }
}

impl FromStr for PartitionId {
    type Err = BalanceError;

    /// Split on the last `-`; topic names may contain dashes themselves.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (topic, index) =
            s.rsplit_once('-').ok_or_else(|| BalanceError::InvalidPartitionId(s.to_string()))?;
        if topic.is_empty() {
            return Err(BalanceError::InvalidPartitionId(s.to_string()));
        }
        let index =
            index.parse().ok().ok_or_else(|| BalanceError::InvalidPartitionId(s.to_string()))?;
        Ok(Self::new(topic, index))
    }
}

/// A partition a donor drive can give away, with its on-disk size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub size_bytes: u64,
    pub partition: PartitionId,
}

impl Candidate {
    pub(crate) const fn new(size_bytes: u64, partition: PartitionId) -> Self {
        Self { size_bytes, partition }
    }
}

/// Role a drive plays in this run after classification against the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DriveRole {
    Donor,
    Receiver,
    Balanced,
}

/// One local log volume on the broker.
///
/// Capacity facts are fixed at construction. Only `bytes_needed` and
/// `candidates` change while the balancing run consumes the drive.
#[derive(Debug, Clone)]
pub(crate) struct Drive {
    pub path: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    percent_used: f64,
    /// Positive: may receive this many bytes. Negative: must shed this many.
    pub bytes_needed: i64,
    /// Largest first.
    pub candidates: Vec<Candidate>,
}

impl Drive {
    pub(crate) fn new(
        total_bytes: u64,
        used_bytes: u64,
        free_bytes: u64,
        path: impl Into<String>,
    ) -> Self {
        let percent_used =
            if total_bytes == 0 { 0.0 } else { used_bytes as f64 / total_bytes as f64 };
        Self {
            path: path.into(),
            total_bytes,
            used_bytes,
            free_bytes,
            percent_used,
            bytes_needed: 0,
            candidates: Vec::new(),
        }
    }

    /// Utilization as a fraction (0.0 - 1.0), computed once from the report.
    pub(crate) const fn percent_used(&self) -> f64 {
        self.percent_used
    }

    /// Set `bytes_needed` from the goal, leaving drives inside
    /// `[goal, goal + threshold_band]` untouched.
    pub(crate) fn add_bytes_needed(&mut self, goal: f64, threshold_band: f64) {
        if goal <= self.percent_used && self.percent_used <= goal + threshold_band {
            self.bytes_needed = 0;
            return;
        }
        self.bytes_needed = ((goal - self.percent_used) * self.total_bytes as f64) as i64;
    }

    pub(crate) const fn role(&self) -> DriveRole {
        if self.bytes_needed < 0 {
            DriveRole::Donor
        } else if self.bytes_needed > 0 {
            DriveRole::Receiver
        } else {
            DriveRole::Balanced
        }
    }

    /// Bytes this drive still has to shed, zero unless it is a donor.
    pub(crate) const fn deficit(&self) -> u64 {
        if self.bytes_needed < 0 { self.bytes_needed.unsigned_abs() } else { 0 }
    }

    /// Remaining receive capacity, zero unless it is a receiver.
    pub(crate) const fn headroom(&self) -> u64 {
        if self.bytes_needed > 0 { self.bytes_needed as u64 } else { 0 }
    }

    /// Directory the broker keeps partition logs in on this drive.
    pub(crate) fn data_dir(&self, data_subdir: &str) -> String {
        if data_subdir.is_empty() {
            return self.path.clone();
        }
        format!("{}/{}", self.path.trim_end_matches('/'), data_subdir)
    }
}

impl fmt::Display for Drive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} total={} used={} free={} used%={:.1} bytes_needed={} candidates={}",
            self.path,
            self.total_bytes,
            self.used_bytes,
            self.free_bytes,
            self.percent_used * 100.0,
            self.bytes_needed,
            self.candidates.len()
        )
    }
}

/// Request payload for the tool's generate step. One entry per topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TopicsToMove {
    pub topics: Vec<TopicEntry>,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TopicEntry {
    pub topic: String,
}

/// Replica and log-directory layout, as produced by generate and consumed by execute/verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ReassignmentLayout {
    #[serde(default = "default_version")]
    pub version: u32,
    pub partitions: Vec<PartitionAssignment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PartitionAssignment {
    pub topic: String,
    pub partition: u32,
    pub replicas: Vec<u32>,
    #[serde(default)]
    pub log_dirs: Vec<String>,
}

impl PartitionAssignment {
    pub(crate) fn partition_id(&self) -> PartitionId {
        PartitionId::new(self.topic.clone(), self.partition)
    }
}

const fn default_version() -> u32 {
    1
}
