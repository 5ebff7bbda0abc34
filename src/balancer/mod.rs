mod batch;
mod convergence;
mod goal;
mod patcher;
mod selector;
mod types;

pub(crate) use convergence::{ConvergenceLoop, RunSummary};
pub(crate) use goal::compute_goal;
pub(crate) use selector::inventory;
pub(crate) use types::{Candidate, Drive, DriveRole, PartitionId, ReassignmentLayout, TopicsToMove};

#[cfg(test)]
pub(crate) use batch::{build_batch, BatchLimits};
#[cfg(test)]
pub(crate) use convergence::StopReason;
#[cfg(test)]
pub(crate) use patcher::patch_layout;
#[cfg(test)]
pub(crate) use selector::select_candidates;
#[cfg(test)]
pub(crate) use types::{PartitionAssignment, TopicEntry};

use crate::config::BalanceSettings;
use crate::error::BalanceError;
use crate::events::{Event, EventHub};
use crate::executor::CommandRunner;
use anyhow::Result;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// Compute the goal and set every drive's `bytes_needed` against it.
pub(crate) fn classify_drives(
    drives: &mut [Drive],
    threshold_band: f64,
) -> Result<f64, BalanceError> {
    let goal = compute_goal(drives)?;
    for drive in drives.iter_mut() {
        drive.add_bytes_needed(goal, threshold_band);
        if drive.role() == DriveRole::Balanced {
            info!("{} is within tolerance of the goal, leaving it alone", drive.path);
        }
    }
    Ok(goal)
}

/// Classify, inventory and converge `drives` in one run.
pub(crate) async fn run_balance<R: CommandRunner>(
    runner: &R,
    settings: &BalanceSettings,
    events: &EventHub,
    cancel: CancellationToken,
    drives: &mut [Drive],
) -> Result<RunSummary> {
    let run_id = Uuid::new_v4();
    let goal = classify_drives(drives, settings.threshold_band)?;
    info!("Run {}: goal utilization {:.2}%", run_id, goal * 100.0);

    events.publish(Event::RunStarted {
        run_id: run_id.to_string(),
        goal,
        drives: drives.len(),
        at: Utc::now(),
    });

    for drive in drives.iter_mut() {
        events.publish(Event::DriveClassified {
            path: drive.path.clone(),
            percent_used: drive.percent_used(),
            bytes_needed: drive.bytes_needed,
        });
        inventory(runner, drive, settings).await?;
    }

    ConvergenceLoop::new(runner, settings, events, cancel, run_id).run(drives, goal).await
}
