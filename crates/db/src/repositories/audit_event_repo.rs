//! Repository for the `audit_events` table.

use sqlx::PgExecutor;
use procflow_core::types::DbId;

use crate::models::audit_event::AuditEvent;

const COLUMNS: &str = "id, event_type, workflow_template_id, actor, payload, created_at";

pub struct AuditEventRepo;

impl AuditEventRepo {
    /// Insert a new audit event, returning the generated id.
    pub async fn insert<'e, E>(
        executor: E,
        event_type: &str,
        workflow_template_id: Option<DbId>,
        actor: Option<&str>,
        payload: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "INSERT INTO audit_events (event_type, workflow_template_id, actor, payload)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(event_type)
        .bind(workflow_template_id)
        .bind(actor)
        .bind(payload)
        .fetch_one(executor)
        .await
    }

    /// Events recorded for a workflow template, newest first.
    pub async fn list_by_workflow_template_id<'e, E>(
        executor: E,
        workflow_template_id: DbId,
    ) -> Result<Vec<AuditEvent>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_events
             WHERE workflow_template_id = $1
             ORDER BY id DESC"
        );
        sqlx::query_as::<_, AuditEvent>(&query)
            .bind(workflow_template_id)
            .fetch_all(executor)
            .await
    }
}
