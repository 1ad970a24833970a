//! Live workflow instances started from a template.
//!
//! Only the template reference matters here: it is what makes a template
//! undeletable.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use procflow_core::types::{DbId, Timestamp};

/// A row from the `workflows` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowInstance {
    pub id: DbId,
    pub workflow_template_id: DbId,
    pub name: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkflowInstance {
    pub workflow_template_id: DbId,
    pub name: Option<String>,
}
