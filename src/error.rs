use thiserror::Error;

/// Failures the balancing run distinguishes. All of them end the run.
#[derive(Debug, Error)]
pub(crate) enum BalanceError {
    #[error("command `{command}` failed: {}", stderr.join("; "))]
    Collaborator { command: String, stderr: Vec<String> },

    #[error("broker {broker_id} is not a replica of {partition} in the generated layout")]
    InconsistentLayout { partition: String, broker_id: u32 },

    #[error("all {failed} partitions in round {round} failed to move")]
    TotalBatchFailure { round: u32, failed: usize },

    #[error("no drives to balance")]
    EmptyDriveSet,

    #[error("round {round} still unverified after {elapsed_secs}s")]
    VerificationTimedOut { round: u32, elapsed_secs: u64 },

    #[error("run cancelled by operator")]
    Cancelled,

    #[error("not a partition directory name: {0}")]
    InvalidPartitionId(String),

    #[error("malformed report line: {0}")]
    MalformedReport(String),

    #[error("reassignment tool output did not contain a proposed layout")]
    MissingProposedLayout,
}
