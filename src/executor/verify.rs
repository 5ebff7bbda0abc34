use crate::balancer::PartitionId;
use std::collections::{HashMap, HashSet};

/// Prefix of every per-partition status line the tool prints on verify.
const STATUS_PREFIX: &str = "Reassignment of partition ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PartitionStatus {
    Succeeded,
    Failed,
    InProgress,
}

/// Classify one verify line. Lines that are not partition status lines, or
/// carry none of the known states, yield `None`.
pub(crate) fn classify_line(line: &str) -> Option<(PartitionId, PartitionStatus)> {
    let rest = &line[line.find(STATUS_PREFIX)? + STATUS_PREFIX.len()..];
    let name = rest.split_whitespace().next()?;
    let partition: PartitionId = name.trim_end_matches(['.', ':']).parse().ok()?;
    // Topic names may contain status words; only the text after the name counts.
    let state = &rest.trim_start()[name.len()..];

    let status = if state.contains("completed successfully") || state.contains("is complete") {
        PartitionStatus::Succeeded
    } else if state.contains("failed") {
        PartitionStatus::Failed
    } else if state.contains("in progress") {
        PartitionStatus::InProgress
    } else {
        return None;
    };
    Some((partition, status))
}

/// Counts for one verification pass over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct VerifyTally {
    pub succeeded: usize,
    pub failed: usize,
    pub in_progress: usize,
    pub total: usize,
}

impl VerifyTally {
    /// Every partition in the batch has reached a terminal state.
    pub(crate) const fn settled(&self) -> bool {
        self.succeeded + self.failed == self.total
    }

    pub(crate) const fn all_failed(&self) -> bool {
        self.total > 0 && self.succeeded == 0 && self.failed == self.total
    }
}

/// Tally verify output for the partitions in `batch`.
///
/// Lines naming partitions outside the batch are ignored; when a partition
/// is reported more than once the last line wins.
pub(crate) fn tally_statuses(lines: &[String], batch: &[PartitionId]) -> VerifyTally {
    let wanted: HashSet<&PartitionId> = batch.iter().collect();
    let mut latest: HashMap<PartitionId, PartitionStatus> = HashMap::new();

    for (partition, status) in lines.iter().filter_map(|l| classify_line(l)) {
        if wanted.contains(&partition) {
            latest.insert(partition, status);
        }
    }

    let mut tally = VerifyTally { total: wanted.len(), ..VerifyTally::default() };
    for status in latest.values() {
        match status {
            PartitionStatus::Succeeded => tally.succeeded += 1,
            PartitionStatus::Failed => tally.failed += 1,
            PartitionStatus::InProgress => tally.in_progress += 1,
        }
    }
    tally
}
