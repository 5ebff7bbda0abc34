use super::support::{candidate, df_report, du_report, test_settings, FakeRunner};
use crate::balancer::{run_balance, ConvergenceLoop, Drive, RunSummary, StopReason};
use crate::config::BalanceSettings;
use crate::error::BalanceError;
use crate::events::{Event, EventHub};
use crate::scanner::parse_df_lines;
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn donor_and_receiver(candidates: &[(u64, &str)], headroom: i64) -> Vec<Drive> {
    let mut donor = Drive::new(1_000_000, 800_000, 200_000, "/data/kafka3");
    donor.bytes_needed = -300_000;
    donor.candidates = candidates.iter().map(|(size, name)| candidate(*size, name)).collect();

    let mut receiver = Drive::new(1_000_000, 200_000, 800_000, "/data/kafka1");
    receiver.bytes_needed = headroom;
    vec![donor, receiver]
}

fn three_partitions() -> Vec<(u64, &'static str)> {
    vec![(100_000, "orders-0"), (100_000, "orders-1"), (100_000, "orders-2")]
}

async fn converge(
    runner: &FakeRunner,
    settings: &BalanceSettings,
    drives: &mut [Drive],
) -> anyhow::Result<RunSummary> {
    let events = EventHub::new(64);
    let cancel = CancellationToken::new();
    ConvergenceLoop::new(runner, settings, &events, cancel, Uuid::new_v4()).run(drives, 0.5).await
}

#[tokio::test]
async fn test_four_drive_run_converges() {
    let settings = test_settings();
    let runner = FakeRunner::new().respond("du -sb", du_report());
    let mut drives = parse_df_lines(&df_report(), "data").unwrap();
    let before: Vec<f64> = drives.iter().map(Drive::percent_used).collect();

    let events = EventHub::new(256);
    let summary = run_balance(&runner, &settings, &events, CancellationToken::new(), &mut drives)
        .await
        .unwrap();

    assert_eq!(summary.rounds, 4);
    assert_eq!(summary.partitions_moved, 16);
    assert_eq!(summary.partitions_failed, 0);
    assert_eq!(summary.bytes_planned, 800_000_000_000);
    assert_eq!(summary.stop_reason, StopReason::PoolsExhausted);

    // Only the donor was inventoried.
    assert_eq!(runner.commands_containing("du -sb"), 1);
    assert_eq!(runner.commands_containing("--execute"), 4);

    let after: Vec<f64> = drives.iter().map(Drive::percent_used).collect();
    assert_eq!(before, after);
    assert!(drives[2].candidates.is_empty());
    assert_eq!(drives[0].bytes_needed, 0);
    assert_eq!(drives[1].bytes_needed, 0);
    assert_eq!(drives[3].bytes_needed, 99_969_647_103);

    let instructions = runner.instructions();
    let destinations =
        ["/data/kafka1/data", "/data/kafka2/data", "/data/kafka4/data", "/data/kafka4/data"];
    let mut seen = HashSet::new();
    for (instruction, destination) in instructions.iter().zip(destinations) {
        assert!(instruction.partitions.len() <= 5);
        for record in &instruction.partitions {
            assert!(seen.insert(record.partition_id()), "{} moved twice", record.partition_id());
            for (broker, dir) in record.replicas.iter().zip(&record.log_dirs) {
                if *broker == 2 {
                    assert_eq!(dir, destination);
                } else {
                    assert_eq!(dir, "any");
                }
            }
        }
    }
    assert_eq!(seen.len(), 16);

    let first: Vec<String> =
        instructions[0].partitions.iter().map(|p| p.partition_id().to_string()).collect();
    assert_eq!(first, vec!["testTopic-1", "testTopic-2", "testTopic-5", "testTopic1-0"]);
}

#[tokio::test]
async fn test_partial_failure_is_accepted() {
    let settings = test_settings();
    let runner = FakeRunner::new().failing(&["orders-2"]);
    let mut drives = donor_and_receiver(&three_partitions(), 300_000);

    let summary = converge(&runner, &settings, &mut drives).await.unwrap();

    assert_eq!(summary.rounds, 1);
    assert_eq!(summary.partitions_moved, 2);
    assert_eq!(summary.partitions_failed, 1);
    assert_eq!(summary.stop_reason, StopReason::PoolsExhausted);
    assert!(drives[0].candidates.is_empty());
}

#[tokio::test]
async fn test_total_failure_aborts_run() {
    let settings = test_settings();
    let runner = FakeRunner::new().failing(&["orders-0", "orders-1", "orders-2"]);
    let mut drives = donor_and_receiver(&three_partitions(), 300_000);

    let err = converge(&runner, &settings, &mut drives).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BalanceError>(),
        Some(BalanceError::TotalBatchFailure { round: 1, failed: 3 })
    ));
}

#[tokio::test]
async fn test_polls_until_settled() {
    let settings = test_settings();
    let runner = FakeRunner::new().in_progress_polls(3);
    let mut drives = donor_and_receiver(&[(100_000, "orders-0")], 300_000);

    let events = EventHub::new(64);
    let mut rx = events.subscribe();
    ConvergenceLoop::new(&runner, &settings, &events, CancellationToken::new(), Uuid::new_v4())
        .run(&mut drives, 0.5)
        .await
        .unwrap();

    assert_eq!(runner.commands_containing("--verify"), 4);

    let mut progress = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::VerifyProgress { in_progress, succeeded, .. } = event {
            progress.push((in_progress, succeeded));
        }
    }
    assert_eq!(progress, vec![(1, 0), (1, 0), (1, 0), (0, 1)]);
}

#[tokio::test]
async fn test_verification_timeout() {
    let mut settings = test_settings();
    settings.poll_timeout = Some(Duration::ZERO);
    let runner = FakeRunner::new().in_progress_polls(usize::MAX);
    let mut drives = donor_and_receiver(&[(100_000, "orders-0")], 300_000);

    let err = converge(&runner, &settings, &mut drives).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BalanceError>(),
        Some(BalanceError::VerificationTimedOut { round: 1, .. })
    ));
}

#[tokio::test]
async fn test_cancelled_run_submits_nothing() {
    let settings = test_settings();
    let runner = FakeRunner::new();
    let mut drives = donor_and_receiver(&three_partitions(), 300_000);

    let events = EventHub::new(64);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = ConvergenceLoop::new(&runner, &settings, &events, cancel, Uuid::new_v4())
        .run(&mut drives, 0.5)
        .await
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<BalanceError>(), Some(BalanceError::Cancelled)));
    assert_eq!(runner.commands_containing("--generate"), 0);
    assert_eq!(runner.commands_containing("--execute"), 0);
    assert_eq!(drives[0].candidates.len(), 3);
}

#[tokio::test]
async fn test_cancellation_stops_polling() {
    let mut settings = test_settings();
    settings.poll_interval = Duration::from_millis(50);
    let runner = FakeRunner::new().in_progress_polls(usize::MAX);
    let mut drives = donor_and_receiver(&[(100_000, "orders-0")], 300_000);

    let events = EventHub::new(64);
    let mut rx = events.subscribe();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let watcher = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if matches!(event, Event::BatchSubmitted { .. }) {
                trigger.cancel();
                break;
            }
        }
    });

    let err = ConvergenceLoop::new(&runner, &settings, &events, cancel, Uuid::new_v4())
        .run(&mut drives, 0.5)
        .await
        .unwrap_err();
    watcher.await.unwrap();

    assert!(matches!(err.downcast_ref::<BalanceError>(), Some(BalanceError::Cancelled)));
    // The submitted batch is left to the tool.
    assert_eq!(runner.commands_containing("--execute"), 1);
}

#[tokio::test]
async fn test_round_limit() {
    let mut settings = test_settings();
    settings.max_partitions_per_batch = 1;
    settings.max_rounds = 2;
    let runner = FakeRunner::new();
    let mut drives = donor_and_receiver(
        &[(10_000, "orders-0"), (10_000, "orders-1"), (10_000, "orders-2"), (10_000, "orders-3")],
        300_000,
    );

    let summary = converge(&runner, &settings, &mut drives).await.unwrap();
    assert_eq!(summary.rounds, 2);
    assert_eq!(summary.stop_reason, StopReason::RoundLimit);
    assert_eq!(drives[0].candidates.len(), 2);
    assert_eq!(drives[1].bytes_needed, 280_000);
}

#[tokio::test]
async fn test_donor_that_fits_nowhere_leaves_pool() {
    let settings = test_settings();
    let runner = FakeRunner::new();
    let mut drives = donor_and_receiver(&[(500_000, "orders-0")], 100_000);

    let summary = converge(&runner, &settings, &mut drives).await.unwrap();
    assert_eq!(summary.rounds, 0);
    assert_eq!(summary.stop_reason, StopReason::PoolsExhausted);
    assert!(runner.commands.lock().unwrap().is_empty());
    assert_eq!(drives[0].candidates.len(), 1);
}

#[tokio::test]
async fn test_generate_failure_is_fatal() {
    let settings = test_settings();
    let runner = FakeRunner::new().fail_on("--generate");
    let mut drives = donor_and_receiver(&[(100_000, "orders-0")], 300_000);

    let err = converge(&runner, &settings, &mut drives).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BalanceError>(),
        Some(BalanceError::Collaborator { .. })
    ));
    assert_eq!(runner.commands_containing("--execute"), 0);
}

#[tokio::test]
async fn test_layout_without_local_broker_is_fatal() {
    let mut settings = test_settings();
    settings.broker_id = 9;
    let runner = FakeRunner::new();
    let mut drives = donor_and_receiver(&[(100_000, "orders-0")], 300_000);

    let err = converge(&runner, &settings, &mut drives).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BalanceError>(),
        Some(BalanceError::InconsistentLayout { broker_id: 9, .. })
    ));
}

#[tokio::test]
async fn test_empty_drive_set_is_fatal() {
    let settings = test_settings();
    let runner = FakeRunner::new();
    let events = EventHub::new(8);
    let err = run_balance(&runner, &settings, &events, CancellationToken::new(), &mut [])
        .await
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<BalanceError>(), Some(BalanceError::EmptyDriveSet)));
}
