use super::types::{Candidate, PartitionId, TopicEntry, TopicsToMove};

/// Limits applied while filling one batch.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BatchLimits {
    pub max_partitions: usize,
    /// How far past the receiver's headroom the last accepted partition may reach,
    /// as a fraction of that headroom. Headroom is an estimate.
    pub overshoot_ratio: f64,
}

/// One round's worth of partitions bound for a single receiver.
#[derive(Debug, Clone)]
pub(crate) struct PlannedBatch {
    pub topics_to_move: TopicsToMove,
    pub accepted: Vec<Candidate>,
    pub leftover: Vec<Candidate>,
    /// Receiver headroom once this batch lands, floored at zero.
    pub headroom_after: u64,
}

impl PlannedBatch {
    pub(crate) fn partitions(&self) -> Vec<PartitionId> {
        self.accepted.iter().map(|c| c.partition.clone()).collect()
    }

    pub(crate) fn accepted_bytes(&self) -> u64 {
        self.accepted.iter().map(|c| c.size_bytes).sum()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Walk `candidates` in order and take what fits into `headroom`.
///
/// A candidate is taken while the bytes accepted so far are within the
/// headroom, adding it stays under the overshoot ceiling, and the batch is
/// not full. Everything else comes back as leftover, in its original order.
pub(crate) fn build_batch(
    candidates: &[Candidate],
    headroom: u64,
    limits: BatchLimits,
) -> PlannedBatch {
    let ceiling = headroom as f64 * (1.0 + limits.overshoot_ratio);

    let mut accepted: Vec<Candidate> = Vec::new();
    let mut leftover: Vec<Candidate> = Vec::new();
    let mut topics: Vec<TopicEntry> = Vec::new();
    let mut bytes: u64 = 0;

    for candidate in candidates {
        let fits = bytes <= headroom
            && (bytes + candidate.size_bytes) as f64 <= ceiling
            && accepted.len() < limits.max_partitions;

        if !fits {
            leftover.push(candidate.clone());
            continue;
        }

        bytes += candidate.size_bytes;
        if !topics.iter().any(|t| t.topic == candidate.partition.topic) {
            topics.push(TopicEntry { topic: candidate.partition.topic.clone() });
        }
        accepted.push(candidate.clone());
    }

    PlannedBatch {
        topics_to_move: TopicsToMove { topics, version: 1 },
        accepted,
        leftover,
        headroom_after: headroom.saturating_sub(bytes),
    }
}
