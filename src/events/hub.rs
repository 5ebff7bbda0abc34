use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Progress events published by the balancing run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub(crate) enum Event {
    RunStarted { run_id: String, goal: f64, drives: usize, at: DateTime<Utc> },

    /// A drive was classified against the goal.
    DriveClassified { path: String, percent_used: f64, bytes_needed: i64 },

    RoundStarted { round: u32, donor: String, receiver: String },

    /// The patched instruction was handed to the reassignment tool.
    BatchSubmitted { round: u32, partitions: Vec<String>, bytes: u64 },

    /// One verification poll.
    VerifyProgress { round: u32, succeeded: usize, failed: usize, in_progress: usize, total: usize },

    BatchComplete { round: u32, succeeded: usize, failed: usize },

    /// A donor left the pool with nothing more it can give.
    DonorExhausted { path: String },

    /// A receiver left the pool with no headroom left.
    ReceiverSatisfied { path: String },

    RunComplete {
        run_id: String,
        rounds: u32,
        partitions_moved: usize,
        partitions_failed: usize,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Returns the event type name for this event variant.
    pub(crate) const fn event_type(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::DriveClassified { .. } => "drive_classified",
            Self::RoundStarted { .. } => "round_started",
            Self::BatchSubmitted { .. } => "batch_submitted",
            Self::VerifyProgress { .. } => "verify_progress",
            Self::BatchComplete { .. } => "batch_complete",
            Self::DonorExhausted { .. } => "donor_exhausted",
            Self::ReceiverSatisfied { .. } => "receiver_satisfied",
            Self::RunComplete { .. } => "run_complete",
        }
    }
}

/// The central event broadcast hub.
///
/// The balancing run publishes here; the binary's progress reporter (and
/// tests) subscribe.
#[derive(Debug, Clone)]
pub(crate) struct EventHub {
    sender: broadcast::Sender<Event>,
}

impl EventHub {
    /// Create a new EventHub with the given channel capacity.
    ///
    /// Subscribers that fall behind by more than `capacity` events receive a
    /// `Lagged` error and miss intermediate events.
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Events are fire-and-forget; having no subscriber is not an error.
    pub(crate) fn publish(&self, event: Event) {
        let _ = self.sender.send(event);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}
