//! Workflow history models and DTOs.
//!
//! History is an append-only ledger. Only `is_current_version` ever changes
//! after insert.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use procflow_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `workflow_histories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowHistory {
    pub id: DbId,
    pub workflow_template_id: DbId,
    pub user_id: String,
    pub data: serde_json::Value,
    /// `None` for auto-save rows.
    pub version: Option<String>,
    pub is_current_version: bool,
    pub meta: serde_json::Value,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A history row without its snapshot, for version listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowHistorySummary {
    pub id: DbId,
    pub workflow_template_id: DbId,
    pub user_id: String,
    pub version: Option<String>,
    pub is_current_version: bool,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for appending a history row.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkflowHistory {
    pub workflow_template_id: DbId,
    pub user_id: String,
    pub data: serde_json::Value,
    pub version: Option<String>,
    pub is_current_version: bool,
    pub meta: serde_json::Value,
    pub name: Option<String>,
    pub description: Option<String>,
}
