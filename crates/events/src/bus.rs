//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] carries the overlay's user-facing text channel: status
//! messages from the live loop and the violation list of whatever the
//! overlay currently shows. Share it via `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Status messages
// ---------------------------------------------------------------------------

pub const STATUS_ANALYZING: &str = "Analyzing frame...";
pub const STATUS_UPDATED: &str = "Analysis updated";
pub const STATUS_FAILED: &str = "Frame analysis failed";
pub const STATUS_CAPTURE_UNAVAILABLE: &str = "Could not access webcam";

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

// ---------------------------------------------------------------------------
// OverlayEvent
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Human-readable status line for the UI.
    Status { level: StatusLevel, message: String },

    /// The overlay now shows these violations. `seq` is the live capture
    /// sequence number, `frame` the recorded frame index.
    Violations {
        seq: Option<u64>,
        frame: Option<u64>,
        messages: Vec<String>,
    },

    /// A live capture session started.
    SessionStarted { session_id: String },

    /// A live capture session was torn down.
    SessionStopped { session_id: String },
}

/// An event with the time it was created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayEvent {
    #[serde(flatten)]
    pub kind: EventKind,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl OverlayEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn status(level: StatusLevel, message: impl Into<String>) -> Self {
        Self::new(EventKind::Status {
            level,
            message: message.into(),
        })
    }

    /// Violations shown for a live capture.
    pub fn live_violations(seq: u64, messages: Vec<String>) -> Self {
        Self::new(EventKind::Violations {
            seq: Some(seq),
            frame: None,
            messages,
        })
    }

    /// Violations shown for a recorded frame.
    pub fn frame_violations(frame: u64, messages: Vec<String>) -> Self {
        Self::new(EventKind::Violations {
            seq: None,
            frame: Some(frame),
            messages,
        })
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// Publish/subscribe hub for [`OverlayEvent`]s.
///
/// ```rust
/// use stance_events::bus::{EventBus, OverlayEvent, StatusLevel};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(OverlayEvent::status(StatusLevel::Info, "Analyzing frame..."));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<OverlayEvent>,
}

impl EventBus {
    /// A bus buffering up to `capacity` undelivered events. Receivers
    /// that fall further behind get `RecvError::Lagged` and lose the
    /// oldest ones.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send `event` to every current subscriber.
    pub fn publish(&self, event: OverlayEvent) {
        // SendError only means there are zero receivers.
        if self.sender.send(event).is_err() {
            tracing::trace!("Overlay event dropped; no subscribers");
        }
    }

    pub fn publish_status(&self, level: StatusLevel, message: impl Into<String>) {
        self.publish(OverlayEvent::status(level, message));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OverlayEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_status() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish_status(StatusLevel::Error, STATUS_FAILED);

        let received = rx.recv().await.unwrap();
        assert_eq!(
            received.kind,
            EventKind::Status {
                level: StatusLevel::Error,
                message: STATUS_FAILED.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn every_subscriber_sees_live_violations() {
        let bus = EventBus::new(4);
        let mut overlay_rx = bus.subscribe();
        let mut log_rx = bus.subscribe();

        bus.publish(OverlayEvent::live_violations(3, vec!["Neck bent 40° > 30°".into()]));

        let shown = overlay_rx.recv().await.unwrap();
        let logged = log_rx.recv().await.unwrap();
        assert_eq!(shown.kind, logged.kind);
        assert_eq!(shown.timestamp, logged.timestamp);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish_status(StatusLevel::Info, STATUS_ANALYZING);
    }

    #[test]
    fn event_serializes_flat_with_type_tag() {
        let event = OverlayEvent::frame_violations(12, vec!["Knee is ahead of ankle".into()]);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "violations");
        assert_eq!(value["frame"], 12);
        assert!(value["seq"].is_null());
        assert_eq!(value["messages"][0], "Knee is ahead of ankle");
        assert!(value["timestamp"].is_string());
    }
}
