//! Update progress events for presentation layers.
//!
//! Effects report through a broadcast channel; subscribers render the
//! stream however they like. Dropped events are acceptable, the state
//! machine itself never depends on them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Phase of the update flow an effect is reporting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePhase {
    Checking,
    Fetching,
    BackingUp,
    Merging,
    Restoring,
    Installing,
    Completed,
    Failed,
}

impl std::fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdatePhase::Checking => write!(f, "Checking..."),
            UpdatePhase::Fetching => write!(f, "Fetching..."),
            UpdatePhase::BackingUp => write!(f, "Backing up..."),
            UpdatePhase::Merging => write!(f, "Merging..."),
            UpdatePhase::Restoring => write!(f, "Restoring..."),
            UpdatePhase::Installing => write!(f, "Installing..."),
            UpdatePhase::Completed => write!(f, "Completed"),
            UpdatePhase::Failed => write!(f, "Failed"),
        }
    }
}

/// One progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressEvent {
    /// Identifier shared by all events of one operation.
    pub operation_id: String,
    pub phase: UpdatePhase,
    /// Human-readable status message.
    pub message: String,
    /// Raw subprocess output line, when one triggered the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
    /// Error message if the operation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl UpdateProgressEvent {
    pub fn new(operation_id: &str, phase: UpdatePhase, message: &str) -> Self {
        Self {
            operation_id: operation_id.to_string(),
            phase,
            message: message.to_string(),
            raw_output: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn completed(operation_id: &str, message: &str) -> Self {
        Self::new(operation_id, UpdatePhase::Completed, message)
    }

    pub fn failed(operation_id: &str, error: &str) -> Self {
        let mut event = Self::new(operation_id, UpdatePhase::Failed, "Operation failed");
        event.error = Some(error.to_string());
        event
    }

    pub fn with_raw_output(mut self, output: &str) -> Self {
        self.raw_output = Some(output.to_string());
        self
    }
}

/// Cooperative cancellation flag, checked before an effect's outcome is
/// dispatched. Cancelling never interrupts a git subprocess mid-flight.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Tracks progress for a single run of the update flow.
pub struct OperationProgress {
    operation_id: String,
    broadcaster: Arc<broadcast::Sender<UpdateProgressEvent>>,
}

impl OperationProgress {
    fn new(broadcaster: Arc<broadcast::Sender<UpdateProgressEvent>>) -> Self {
        Self {
            operation_id: Uuid::new_v4().to_string(),
            broadcaster,
        }
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Broadcasts a phase update.
    pub fn phase(&self, phase: UpdatePhase, message: &str) {
        let event = UpdateProgressEvent::new(&self.operation_id, phase, message);
        let _ = self.broadcaster.send(event);
    }

    /// Broadcasts a raw subprocess output line.
    pub fn output(&self, phase: UpdatePhase, line: &str) {
        let event = UpdateProgressEvent::new(&self.operation_id, phase, &phase.to_string())
            .with_raw_output(line);
        let _ = self.broadcaster.send(event);
    }

    pub fn completed(&self, message: &str) {
        let _ = self
            .broadcaster
            .send(UpdateProgressEvent::completed(&self.operation_id, message));
    }

    pub fn failed(&self, error: &str) {
        let _ = self
            .broadcaster
            .send(UpdateProgressEvent::failed(&self.operation_id, error));
    }
}

/// Broadcasts update progress events to any number of subscribers.
#[derive(Clone)]
pub struct UpdateProgressBroadcaster {
    sender: Arc<broadcast::Sender<UpdateProgressEvent>>,
}

impl UpdateProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UpdateProgressEvent> {
        self.sender.subscribe()
    }

    /// Starts tracking a new operation with a fresh id.
    pub fn start_operation(&self) -> OperationProgress {
        OperationProgress::new(Arc::clone(&self.sender))
    }
}

impl Default for UpdateProgressBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}
