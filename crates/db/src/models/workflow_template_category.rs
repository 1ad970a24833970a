//! Workflow template category models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use procflow_core::types::{DbId, Timestamp};

/// A row from the `workflow_template_categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowTemplateCategory {
    pub id: DbId,
    pub name: String,
    pub parent_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WorkflowTemplateCategory {
    pub fn to_portable(&self) -> CreateWorkflowTemplateCategory {
        CreateWorkflowTemplateCategory {
            id: self.id,
            name: self.name.clone(),
            parent_id: self.parent_id,
        }
    }
}

/// Input for creating or upserting a category with a known id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateWorkflowTemplateCategory {
    pub id: DbId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<DbId>,
}
