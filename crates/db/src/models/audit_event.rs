//! Audit event models.

use serde::Serialize;
use sqlx::FromRow;
use procflow_core::types::{DbId, Timestamp};

/// A row from the `audit_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditEvent {
    pub id: DbId,
    pub event_type: String,
    pub workflow_template_id: Option<DbId>,
    pub actor: Option<String>,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}
