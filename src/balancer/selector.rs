use super::types::{Candidate, Drive, DriveRole};
use crate::config::BalanceSettings;
use crate::executor::CommandRunner;
use crate::scanner;
use anyhow::Result;
use tracing::{debug, info, warn};

/// Greedy largest-first selection that never overshoots `deficit`.
///
/// `inventory` must be sorted by size, descending. Selection stops at the
/// first entry that would push the total past `deficit`, so a donor whose
/// largest partition alone exceeds its deficit selects nothing.
pub(crate) fn select_candidates(inventory: &[Candidate], deficit: u64) -> Vec<Candidate> {
    let mut selected = Vec::new();
    let mut acc: u64 = 0;

    for entry in inventory {
        if acc == deficit {
            break;
        }
        let Some(next) = acc.checked_add(entry.size_bytes) else { break };
        if next > deficit {
            break;
        }
        acc = next;
        selected.push(entry.clone());
    }

    selected
}

/// Fill `drive.candidates` from the partitions currently on disk.
///
/// Only donors are inventoried; other drives are left untouched.
pub(crate) async fn inventory<R: CommandRunner>(
    runner: &R,
    drive: &mut Drive,
    settings: &BalanceSettings,
) -> Result<()> {
    if drive.role() != DriveRole::Donor {
        return Ok(());
    }

    let data_dir = drive.data_dir(&settings.data_subdir);
    let command = scanner::du_command(&data_dir, settings.inventory_limit);
    let lines = runner.execute(&command).await?;
    let on_disk = scanner::parse_du_lines(&lines);
    debug!("{}: {} partitions reported by du", drive.path, on_disk.len());

    drive.candidates = select_candidates(&on_disk, drive.deficit());

    let selected_bytes: u64 = drive.candidates.iter().map(|c| c.size_bytes).sum();
    if drive.candidates.is_empty() {
        warn!(
            "{}: no partition fits inside the {} byte deficit; nothing will be moved off it",
            drive.path,
            drive.deficit()
        );
    } else {
        for c in &drive.candidates {
            let gigabytes = c.size_bytes as f64 * 1e-9;
            info!("{}: {} ({:.1}G) can be moved", drive.path, c.partition, gigabytes);
        }
        info!(
            "{}: selected {} partitions, {} of {} bytes",
            drive.path,
            drive.candidates.len(),
            selected_bytes,
            drive.deficit()
        );
    }

    Ok(())
}
