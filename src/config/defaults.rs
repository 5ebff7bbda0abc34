/// Default location of the balancer config file.
pub(super) const DEFAULT_CONFIG_PATH: &str = "/etc/logdir-balancer/balancer.cfg";

/// Prefix for environment variable overrides (`LDB_BROKER_ID`, `LDB_HOST`, ...).
pub(super) const ENV_PREFIX: &str = "LDB_";

/// Drives within `[goal, goal + band]` are left alone.
pub(super) const DEFAULT_THRESHOLD_BAND: f64 = 0.05;

/// Partitions relocated per round. Bounds how much a single execute can break.
pub(super) const DEFAULT_MAX_PARTITIONS_PER_BATCH: usize = 5;

/// Hard ceiling on submitted rounds per run.
pub(super) const DEFAULT_MAX_ROUNDS: u32 = 5;

/// How far a batch may overshoot the receiver's estimated headroom.
pub(super) const DEFAULT_BATCH_OVERSHOOT_RATIO: f64 = 0.05;

/// Largest `du` entries considered per donor drive.
pub(super) const DEFAULT_INVENTORY_LIMIT: usize = 80;

pub(super) const DEFAULT_DATA_SUBDIR: &str = "data";

/// `df` lines must contain this to count as a log volume.
pub(super) const DEFAULT_MOUNT_FILTER: &str = "data";

pub(super) const DEFAULT_REASSIGN_BIN: &str = "kafka-reassign-partitions";

pub(super) const DEFAULT_BROKER_LIST: &str = "1,2,3";

pub(super) const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

/// Placeholder in endpoint templates replaced by the environment tag.
pub(super) const ENV_PLACEHOLDER: &str = "{env}";
