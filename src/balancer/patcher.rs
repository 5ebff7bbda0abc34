use super::types::{PartitionId, ReassignmentLayout};
use crate::error::BalanceError;
use std::collections::HashSet;

/// Log directory value the tool uses for "broker's choice".
const ANY_LOG_DIR: &str = "any";

/// Narrow a generated layout to `accepted` and point this broker's replica at `destination`.
///
/// Only the log-directory slot at the local broker's replica position is
/// rewritten; other brokers' slots pass through as generated. Returns the
/// patched layout and the number of partitions it covers.
pub(crate) fn patch_layout(
    mut layout: ReassignmentLayout,
    accepted: &[PartitionId],
    destination: &str,
    local_broker_id: u32,
) -> Result<(ReassignmentLayout, usize), BalanceError> {
    let wanted: HashSet<&PartitionId> = accepted.iter().collect();
    layout.partitions.retain(|record| wanted.contains(&record.partition_id()));

    for record in &mut layout.partitions {
        let position = record.replicas.iter().position(|&b| b == local_broker_id).ok_or_else(
            || BalanceError::InconsistentLayout {
                partition: record.partition_id().to_string(),
                broker_id: local_broker_id,
            },
        )?;

        if record.log_dirs.is_empty() {
            record.log_dirs = vec![ANY_LOG_DIR.to_string(); record.replicas.len()];
        }
        if record.log_dirs.len() != record.replicas.len() {
            return Err(BalanceError::InconsistentLayout {
                partition: record.partition_id().to_string(),
                broker_id: local_broker_id,
            });
        }

        record.log_dirs[position] = destination.to_string();
    }

    let count = layout.partitions.len();
    Ok((layout, count))
}
