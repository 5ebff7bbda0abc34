use super::Event;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

/// Log every event from `rx` until the hub is dropped.
pub(crate) async fn report_progress(rx: broadcast::Receiver<Event>) {
    let mut stream = BroadcastStream::new(rx);

    while let Some(result) = stream.next().await {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                warn!("Progress reporter lagged: {}", e);
                continue;
            }
        };

        match &event {
            Event::VerifyProgress { round, succeeded, failed, in_progress, total } => info!(
                "Round {}: reassigning partitions... {}/{} done, {} failed, {} in progress",
                round,
                succeeded + failed,
                total,
                failed,
                in_progress
            ),
            Event::BatchComplete { round, succeeded, failed } => {
                if *failed == 0 {
                    info!("Round {}: {} partitions moved successfully", round, succeeded);
                } else {
                    warn!("Round {}: {} partitions moved, {} failed", round, succeeded, failed);
                }
            }
            other => match serde_json::to_string(other) {
                Ok(json) => debug!(event = other.event_type(), "{}", json),
                Err(e) => warn!("Could not serialize {} event: {}", other.event_type(), e),
            },
        }
    }
}
