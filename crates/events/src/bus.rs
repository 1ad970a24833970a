//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use procflow_core::types::DbId;

/// Event names published by the services.
pub mod event_types {
    pub const TEMPLATE_CREATED: &str = "workflow_template.created";
    pub const TEMPLATE_UPDATED: &str = "workflow_template.updated";
    pub const TEMPLATE_DELETED: &str = "workflow_template.deleted";
    pub const VERSION_SAVED: &str = "workflow_template.version_saved";
    pub const AUTO_SAVED: &str = "workflow_template.auto_saved";
    pub const IMPORTED: &str = "workflow_template.imported";
    pub const COPY_PREPARED: &str = "workflow_template.copy_prepared";
    pub const COPIED: &str = "workflow_template.copied";
}

// ---------------------------------------------------------------------------
// WorkflowEvent
// ---------------------------------------------------------------------------

/// Something that happened to a workflow template.
///
/// Built with [`WorkflowEvent::new`] and the `with_*` methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
    /// Dot-separated event name, see [`event_types`].
    pub event_type: String,

    /// The workflow template the event concerns.
    pub workflow_template_id: Option<DbId>,

    /// User id of whoever triggered the event.
    pub actor: Option<String>,

    /// Event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl WorkflowEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            workflow_template_id: None,
            actor: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_template(mut self, workflow_template_id: DbId) -> Self {
        self.workflow_template_id = Some(workflow_template_id);
        self
    }

    pub fn with_actor(mut self, user_id: impl Into<String>) -> Self {
        self.actor = Some(user_id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use procflow_events::bus::{EventBus, WorkflowEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(WorkflowEvent::new("workflow_template.created").with_template(12));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest messages are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: WorkflowEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            WorkflowEvent::new(event_types::COPIED)
                .with_template(456)
                .with_actor("u1")
                .with_payload(serde_json::json!({"source_id": 123})),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "workflow_template.copied");
        assert_eq!(received.workflow_template_id, Some(456));
        assert_eq!(received.actor.as_deref(), Some("u1"));
        assert_eq!(received.payload["source_id"], 123);
    }

    #[tokio::test]
    async fn every_subscriber_sees_the_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(WorkflowEvent::new(event_types::IMPORTED));

        assert_eq!(rx1.recv().await.unwrap().event_type, event_types::IMPORTED);
        assert_eq!(rx2.recv().await.unwrap().event_type, event_types::IMPORTED);
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        EventBus::default().publish(WorkflowEvent::new("orphan"));
    }
}
