use super::defaults::ENV_PREFIX;
use super::settings::BalancerConfig;
use std::str::FromStr;
use tracing::warn;

/// Keys recognised in the config file. Each can also be set as `LDB_<KEY>`.
pub(crate) const KEYS: &[&str] = &[
    "HOST",
    "USER",
    "BROKER_ID",
    "ENVIRONMENT",
    "RUN_AS",
    "THRESHOLD_BAND",
    "MAX_PARTITIONS_PER_BATCH",
    "MAX_ROUNDS",
    "BATCH_OVERSHOOT_RATIO",
    "INVENTORY_LIMIT",
    "DATA_SUBDIR",
    "MOUNT_FILTER",
    "REASSIGN_BIN",
    "ZOOKEEPER",
    "BOOTSTRAP_SERVERS",
    "COMMAND_CONFIG",
    "BROKER_LIST",
    "POLL_INTERVAL_MS",
    "POLL_TIMEOUT_SECS",
];

fn parse_into<T: FromStr>(slot: &mut T, key: &str, value: &str) {
    match value.parse() {
        Ok(v) => *slot = v,
        Err(_) => warn!("Ignoring invalid value for {key}: {value:?}"),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() { None } else { Some(value.to_string()) }
}

impl BalancerConfig {
    /// Parse the simple KEY="VALUE" config format.
    pub(crate) fn parse_ini(&mut self, contents: &str) {
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                self.apply_key(key.trim(), value.trim().trim_matches('"'));
            }
        }
    }

    /// Apply `LDB_<KEY>` overrides. `lookup` is `std::env::var` outside tests.
    pub(crate) fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for key in KEYS {
            if let Some(value) = lookup(&format!("{ENV_PREFIX}{key}")) {
                self.apply_key(key, value.trim());
            }
        }
    }

    pub(crate) fn apply_key(&mut self, key: &str, value: &str) {
        match key {
            "HOST" => self.host = non_empty(value),
            "USER" => self.user = non_empty(value),
            "BROKER_ID" => match value.parse() {
                Ok(v) => self.broker_id = Some(v),
                Err(_) => warn!("Ignoring invalid value for BROKER_ID: {value:?}"),
            },
            "ENVIRONMENT" => self.environment_tag = value.to_string(),
            "RUN_AS" => self.run_as = non_empty(value),
            "THRESHOLD_BAND" => parse_into(&mut self.threshold_band, key, value),
            "MAX_PARTITIONS_PER_BATCH" => parse_into(&mut self.max_partitions_per_batch, key, value),
            "MAX_ROUNDS" => parse_into(&mut self.max_rounds, key, value),
            "BATCH_OVERSHOOT_RATIO" => parse_into(&mut self.batch_overshoot_ratio, key, value),
            "INVENTORY_LIMIT" => parse_into(&mut self.inventory_limit, key, value),
            "DATA_SUBDIR" => self.data_subdir = value.trim_matches('/').to_string(),
            "MOUNT_FILTER" => self.mount_filter = value.to_string(),
            "REASSIGN_BIN" => self.reassign_bin = value.to_string(),
            "ZOOKEEPER" => self.zookeeper_connect = value.to_string(),
            "BOOTSTRAP_SERVERS" => self.bootstrap_servers = value.to_string(),
            "COMMAND_CONFIG" => self.command_config = non_empty(value),
            "BROKER_LIST" => self.broker_list = value.to_string(),
            "POLL_INTERVAL_MS" => parse_into(&mut self.poll_interval_ms, key, value),
            "POLL_TIMEOUT_SECS" => parse_into(&mut self.poll_timeout_secs, key, value),
            _ => {} // Ignore unknown keys
        }
    }
}
