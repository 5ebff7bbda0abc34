use super::batch::{build_batch, BatchLimits, PlannedBatch};
use super::patcher::patch_layout;
use super::types::{Drive, DriveRole};
use crate::config::BalanceSettings;
use crate::error::BalanceError;
use crate::events::{Event, EventHub};
use crate::executor::{tally_statuses, CommandRunner, ReassignTool, VerifyTally};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Why the loop stopped. Neither is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopReason {
    PoolsExhausted,
    RoundLimit,
}

/// What a completed run did.
#[derive(Debug, Clone)]
pub(crate) struct RunSummary {
    pub run_id: Uuid,
    pub goal: f64,
    pub rounds: u32,
    pub partitions_moved: usize,
    pub partitions_failed: usize,
    pub bytes_planned: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stop_reason: StopReason,
}

/// Pairs the fullest donor with the emptiest receiver until one pool runs dry
/// or the round limit is hit, submitting and verifying one batch per round.
pub(crate) struct ConvergenceLoop<'a, R> {
    runner: &'a R,
    settings: &'a BalanceSettings,
    events: &'a EventHub,
    cancel: CancellationToken,
    run_id: Uuid,
}

impl<'a, R: CommandRunner> ConvergenceLoop<'a, R> {
    pub(crate) const fn new(
        runner: &'a R,
        settings: &'a BalanceSettings,
        events: &'a EventHub,
        cancel: CancellationToken,
        run_id: Uuid,
    ) -> Self {
        Self { runner, settings, events, cancel, run_id }
    }

    /// Run to completion over `drives`, which must already be classified and inventoried.
    pub(crate) async fn run(&self, drives: &mut [Drive], goal: f64) -> Result<RunSummary> {
        let started_at = Utc::now();
        let mut donors: Vec<usize> = indices_with_role(drives, DriveRole::Donor);
        let mut receivers: Vec<usize> = indices_with_role(drives, DriveRole::Receiver);

        let mut rounds: u32 = 0;
        let mut moved = 0usize;
        let mut failed = 0usize;
        let mut bytes_planned = 0u64;
        let mut stop_reason = StopReason::PoolsExhausted;

        info!("{} donor drives, {} receiver drives", donors.len(), receivers.len());

        while !donors.is_empty() && !receivers.is_empty() {
            // Nothing new is submitted once cancelled.
            if self.cancel.is_cancelled() {
                info!("Cancelled after {} rounds", rounds);
                return Err(BalanceError::Cancelled.into());
            }
            if rounds >= self.settings.max_rounds {
                info!("Reached the limit of {} rounds", self.settings.max_rounds);
                stop_reason = StopReason::RoundLimit;
                break;
            }

            let Some(receiver) = pick(drives, &receivers, |a, b| a > b) else { break };
            let Some(donor) = pick(drives, &donors, |a, b| a < b) else { break };

            if drives[donor].candidates.is_empty() {
                info!("{} has no more partitions to move", drives[donor].path);
                donors.retain(|&i| i != donor);
                self.events.publish(Event::DonorExhausted { path: drives[donor].path.clone() });
                continue;
            }
            if drives[receiver].bytes_needed <= 0 {
                info!("{} has received all the data it has room for", drives[receiver].path);
                receivers.retain(|&i| i != receiver);
                self.events
                    .publish(Event::ReceiverSatisfied { path: drives[receiver].path.clone() });
                continue;
            }

            let limits = BatchLimits {
                max_partitions: self.settings.max_partitions_per_batch,
                overshoot_ratio: self.settings.batch_overshoot_ratio,
            };
            let batch = build_batch(&drives[donor].candidates, drives[receiver].headroom(), limits);

            // The receiver with the most headroom could not take anything, so no receiver can.
            if batch.is_empty() {
                warn!(
                    "No partition on {} fits into {} bytes of headroom on {}",
                    drives[donor].path,
                    drives[receiver].headroom(),
                    drives[receiver].path
                );
                donors.retain(|&i| i != donor);
                self.events.publish(Event::DonorExhausted { path: drives[donor].path.clone() });
                continue;
            }

            rounds += 1;
            drives[receiver].bytes_needed = batch.headroom_after as i64;
            drives[donor].candidates.clone_from(&batch.leftover);
            bytes_planned += batch.accepted_bytes();

            let tally = self.run_round(rounds, &drives[donor], &drives[receiver], &batch).await?;
            moved += tally.succeeded;
            failed += tally.failed;
        }

        let summary = RunSummary {
            run_id: self.run_id,
            goal,
            rounds,
            partitions_moved: moved,
            partitions_failed: failed,
            bytes_planned,
            started_at,
            finished_at: Utc::now(),
            stop_reason,
        };

        self.events.publish(Event::RunComplete {
            run_id: self.run_id.to_string(),
            rounds,
            partitions_moved: moved,
            partitions_failed: failed,
            at: summary.finished_at,
        });

        Ok(summary)
    }

    /// Generate, patch, execute and verify one batch from `donor` to `receiver`.
    async fn run_round(
        &self,
        round: u32,
        donor: &Drive,
        receiver: &Drive,
        batch: &PlannedBatch,
    ) -> Result<VerifyTally> {
        let subdir = &self.settings.data_subdir;
        let donor_dir = donor.data_dir(subdir);
        let destination = receiver.data_dir(subdir);
        let partitions = batch.partitions();

        info!(
            "Round {}: moving {} partitions ({} bytes) from {} to {}",
            round,
            partitions.len(),
            batch.accepted_bytes(),
            donor.path,
            receiver.path
        );
        self.events.publish(Event::RoundStarted {
            round,
            donor: donor.path.clone(),
            receiver: receiver.path.clone(),
        });

        let tool = ReassignTool::new(self.runner, &self.settings.tool);

        let topics_file = format!("{donor_dir}/topicsToMove-{}.json", self.run_id);
        let candidate_layout = tool.generate(&topics_file, &batch.topics_to_move).await?;

        let (instruction, count) =
            patch_layout(candidate_layout, &partitions, &destination, self.settings.broker_id)?;
        if count < partitions.len() {
            warn!(
                "Round {}: generated layout covers only {} of {} selected partitions",
                round,
                count,
                partitions.len()
            );
        }
        if count == 0 {
            return Ok(VerifyTally::default());
        }

        let reassignment_file = format!("{donor_dir}/reassignment-{}-r{round}.json", self.run_id);
        tool.execute(&reassignment_file, &instruction).await?;

        let submitted: Vec<_> = instruction.partitions.iter().map(|p| p.partition_id()).collect();
        self.events.publish(Event::BatchSubmitted {
            round,
            partitions: submitted.iter().map(ToString::to_string).collect(),
            bytes: batch.accepted_bytes(),
        });

        let started = Instant::now();
        loop {
            if self.cancel.is_cancelled() {
                return Err(BalanceError::Cancelled.into());
            }

            let lines = tool.verify(&reassignment_file).await?;
            let tally = tally_statuses(&lines, &submitted);
            self.events.publish(Event::VerifyProgress {
                round,
                succeeded: tally.succeeded,
                failed: tally.failed,
                in_progress: tally.in_progress,
                total: tally.total,
            });

            if tally.settled() {
                if tally.all_failed() {
                    let failed = tally.failed;
                    return Err(BalanceError::TotalBatchFailure { round, failed }.into());
                }
                self.events.publish(Event::BatchComplete {
                    round,
                    succeeded: tally.succeeded,
                    failed: tally.failed,
                });
                return Ok(tally);
            }

            if let Some(timeout) = self.settings.poll_timeout {
                if started.elapsed() >= timeout {
                    return Err(BalanceError::VerificationTimedOut {
                        round,
                        elapsed_secs: started.elapsed().as_secs(),
                    }
                    .into());
                }
            }

            tokio::select! {
                () = tokio::time::sleep(self.settings.poll_interval) => {}
                () = self.cancel.cancelled() => return Err(BalanceError::Cancelled.into()),
            }
        }
    }
}

fn indices_with_role(drives: &[Drive], role: DriveRole) -> Vec<usize> {
    drives.iter().enumerate().filter(|(_, d)| d.role() == role).map(|(i, _)| i).collect()
}

/// First drive in `pool` whose `bytes_needed` wins under `better`.
fn pick(drives: &[Drive], pool: &[usize], better: impl Fn(i64, i64) -> bool) -> Option<usize> {
    let mut best: Option<usize> = None;
    for &i in pool {
        match best {
            Some(b) if !better(drives[i].bytes_needed, drives[b].bytes_needed) => {}
            _ => best = Some(i),
        }
    }
    best
}
