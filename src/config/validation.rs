use super::settings::BalancerConfig;
use anyhow::Result;

impl BalancerConfig {
    /// Validate configuration values are sane.
    pub(crate) fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.host.is_some(), "HOST must be set (or pass <user>@<host>)");
        let Some(broker_id) = self.broker_id else {
            anyhow::bail!("BROKER_ID must be set");
        };
        anyhow::ensure!(
            self.broker_ids()?.contains(&broker_id),
            "BROKER_ID {broker_id} is not in BROKER_LIST {}",
            self.broker_list
        );
        anyhow::ensure!(
            (0.0..1.0).contains(&self.threshold_band),
            "threshold_band must be in [0.0, 1.0)"
        );
        anyhow::ensure!(self.max_partitions_per_batch >= 1, "max_partitions_per_batch must be >= 1");
        anyhow::ensure!(self.max_rounds >= 1, "max_rounds must be >= 1");
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.batch_overshoot_ratio),
            "batch_overshoot_ratio must be between 0.0 and 1.0"
        );
        anyhow::ensure!(self.inventory_limit >= 1, "inventory_limit must be >= 1");
        anyhow::ensure!(!self.zookeeper_connect.is_empty(), "ZOOKEEPER must be set");
        anyhow::ensure!(!self.bootstrap_servers.is_empty(), "BOOTSTRAP_SERVERS must be set");
        anyhow::ensure!(!self.reassign_bin.is_empty(), "REASSIGN_BIN must not be empty");
        Ok(())
    }

    /// Parsed `BROKER_LIST`.
    pub(crate) fn broker_ids(&self) -> Result<Vec<u32>> {
        self.broker_list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse().map_err(|e| anyhow::anyhow!("Invalid broker id in BROKER_LIST: {s}: {e}"))
            })
            .collect()
    }
}
