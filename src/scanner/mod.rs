mod disk_space;
mod usage;

pub(crate) use disk_space::{df_command, parse_df_lines};
pub(crate) use usage::{du_command, parse_du_lines};

use crate::balancer::Drive;
use crate::executor::CommandRunner;
use anyhow::Result;
use tracing::{debug, info};

/// Read the broker's log volumes from `df` on the remote host.
pub(crate) async fn load_drives<R: CommandRunner>(
    runner: &R,
    mount_filter: &str,
) -> Result<Vec<Drive>> {
    let lines = runner.execute(&df_command(mount_filter)).await?;
    let drives = parse_df_lines(&lines, mount_filter)?;
    info!("Found {} log volumes matching {:?}", drives.len(), mount_filter);
    for drive in &drives {
        debug!("{drive}");
    }
    Ok(drives)
}
