//! Durable audit persistence.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and writes every [`WorkflowEvent`] to `audit_events`. It runs until the
//! bus is dropped.

use tokio::sync::broadcast;
use procflow_core::types::DbId;
use procflow_db::repositories::AuditEventRepo;
use procflow_db::DbPool;

use crate::bus::WorkflowEvent;

/// Background service that persists audit events.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop until the channel closes.
    ///
    /// A failed insert is logged and skipped; it never reaches the publisher.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<WorkflowEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to persist audit event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Audit persistence lagged, events were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, audit persistence shutting down");
                    break;
                }
            }
        }
    }

    async fn persist(pool: &DbPool, event: &WorkflowEvent) -> Result<DbId, sqlx::Error> {
        AuditEventRepo::insert(
            pool,
            &event.event_type,
            event.workflow_template_id,
            event.actor.as_deref(),
            &event.payload,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::bus::{event_types, EventBus};

    #[sqlx::test(migrations = "../../db/migrations")]
    async fn published_events_are_written(pool: PgPool) {
        let bus = EventBus::default();
        let handle = tokio::spawn(EventPersistence::run(pool.clone(), bus.subscribe()));

        bus.publish(
            WorkflowEvent::new(event_types::VERSION_SAVED)
                .with_template(12)
                .with_actor("u1")
                .with_payload(serde_json::json!({"version": "1.1.0"})),
        );
        drop(bus);
        handle.await.unwrap();

        let rows = AuditEventRepo::list_by_workflow_template_id(&pool, 12)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_type, event_types::VERSION_SAVED);
        assert_eq!(rows[0].actor.as_deref(), Some("u1"));
        assert_eq!(rows[0].payload["version"], "1.1.0");
    }
}
