use super::defaults::{
    DEFAULT_BATCH_OVERSHOOT_RATIO, DEFAULT_BROKER_LIST, DEFAULT_CONFIG_PATH, DEFAULT_DATA_SUBDIR,
    DEFAULT_INVENTORY_LIMIT, DEFAULT_MAX_PARTITIONS_PER_BATCH, DEFAULT_MAX_ROUNDS,
    DEFAULT_MOUNT_FILTER, DEFAULT_POLL_INTERVAL_MS, DEFAULT_REASSIGN_BIN, DEFAULT_THRESHOLD_BAND,
    ENV_PLACEHOLDER,
};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Everything a balancing run can be configured with, as loaded from file and environment.
#[derive(Debug, Clone)]
pub(crate) struct BalancerConfig {
    pub config_path: String,
    pub host: Option<String>,
    pub user: Option<String>,
    /// Broker whose drives are balanced. Must be given explicitly.
    pub broker_id: Option<u32>,
    /// Substituted for `{env}` in the endpoint templates.
    pub environment_tag: String,
    /// Remote account to `sudo` into before running commands.
    pub run_as: Option<String>,
    pub threshold_band: f64,
    pub max_partitions_per_batch: usize,
    pub max_rounds: u32,
    pub batch_overshoot_ratio: f64,
    pub inventory_limit: usize,
    pub data_subdir: String,
    pub mount_filter: String,
    pub reassign_bin: String,
    pub zookeeper_connect: String,
    pub bootstrap_servers: String,
    pub command_config: Option<String>,
    pub broker_list: String,
    pub poll_interval_ms: u64,
    /// 0 polls until every partition settles.
    pub poll_timeout_secs: u64,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            config_path: DEFAULT_CONFIG_PATH.to_string(),
            host: None,
            user: None,
            broker_id: None,
            environment_tag: String::new(),
            run_as: None,
            threshold_band: DEFAULT_THRESHOLD_BAND,
            max_partitions_per_batch: DEFAULT_MAX_PARTITIONS_PER_BATCH,
            max_rounds: DEFAULT_MAX_ROUNDS,
            batch_overshoot_ratio: DEFAULT_BATCH_OVERSHOOT_RATIO,
            inventory_limit: DEFAULT_INVENTORY_LIMIT,
            data_subdir: DEFAULT_DATA_SUBDIR.to_string(),
            mount_filter: DEFAULT_MOUNT_FILTER.to_string(),
            reassign_bin: DEFAULT_REASSIGN_BIN.to_string(),
            zookeeper_connect: String::new(),
            bootstrap_servers: String::new(),
            command_config: None,
            broker_list: DEFAULT_BROKER_LIST.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            poll_timeout_secs: 0,
        }
    }
}

/// Resolved, validated settings handed to the balancing core.
#[derive(Debug, Clone)]
pub(crate) struct BalanceSettings {
    pub broker_id: u32,
    pub environment_tag: String,
    pub threshold_band: f64,
    pub max_partitions_per_batch: usize,
    pub max_rounds: u32,
    pub batch_overshoot_ratio: f64,
    pub inventory_limit: usize,
    pub data_subdir: String,
    pub mount_filter: String,
    pub tool: ToolSettings,
    pub poll_interval: Duration,
    pub poll_timeout: Option<Duration>,
}

/// How to invoke the partition reassignment tool.
#[derive(Debug, Clone)]
pub(crate) struct ToolSettings {
    pub bin: String,
    pub zookeeper_connect: String,
    pub bootstrap_servers: String,
    pub command_config: Option<String>,
    pub broker_list: String,
}

impl BalancerConfig {
    /// Load configuration, merging defaults with config file values and env overrides.
    ///
    /// An explicitly given `path` must exist; the default path is optional.
    pub(crate) fn load(path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        if let Ok(p) = std::env::var("LDB_CONFIG_PATH") {
            config.config_path = p;
        }
        if let Some(p) = path {
            config.config_path = p.to_string();
            anyhow::ensure!(Path::new(p).exists(), "Config file not found: {p}");
        }

        let cfg_path = Path::new(&config.config_path);
        if cfg_path.exists() {
            let contents = fs::read_to_string(cfg_path)
                .with_context(|| format!("Failed to read config file: {}", config.config_path))?;
            config.parse_ini(&contents);
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// `user@host` when a user is configured, otherwise just the host.
    pub(crate) fn ssh_destination(&self) -> Option<String> {
        let host = self.host.as_deref()?;
        Some(match self.user.as_deref() {
            Some(user) if !user.is_empty() => format!("{user}@{host}"),
            _ => host.to_string(),
        })
    }

    /// Validate and resolve into the settings the core runs with.
    pub(crate) fn settings(&self) -> Result<BalanceSettings> {
        self.validate()?;
        let broker_id = self.broker_id.context("BROKER_ID must be set")?;
        let env = self.environment_tag.as_str();

        Ok(BalanceSettings {
            broker_id,
            environment_tag: self.environment_tag.clone(),
            threshold_band: self.threshold_band,
            max_partitions_per_batch: self.max_partitions_per_batch,
            max_rounds: self.max_rounds,
            batch_overshoot_ratio: self.batch_overshoot_ratio,
            inventory_limit: self.inventory_limit,
            data_subdir: self.data_subdir.clone(),
            mount_filter: self.mount_filter.clone(),
            tool: ToolSettings {
                bin: self.reassign_bin.clone(),
                zookeeper_connect: self.zookeeper_connect.replace(ENV_PLACEHOLDER, env),
                bootstrap_servers: self.bootstrap_servers.replace(ENV_PLACEHOLDER, env),
                command_config: self.command_config.clone(),
                broker_list: self.broker_list.clone(),
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            poll_timeout: (self.poll_timeout_secs > 0)
                .then(|| Duration::from_secs(self.poll_timeout_secs)),
        })
    }
}
