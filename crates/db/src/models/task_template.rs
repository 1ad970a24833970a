//! Task template models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use procflow_core::types::{DbId, Timestamp};

use super::empty_object;

/// A row from the `task_templates` table.
///
/// Every task owns exactly one document template.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskTemplate {
    pub id: DbId,
    pub name: String,
    pub document_template_id: DbId,
    pub json_schema: serde_json::Value,
    pub json_schema_raw: Option<String>,
    pub html_template: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TaskTemplate {
    pub fn to_portable(&self) -> CreateTaskTemplate {
        CreateTaskTemplate {
            id: self.id,
            name: self.name.clone(),
            document_template_id: self.document_template_id,
            json_schema: self.json_schema.clone(),
            json_schema_raw: self.json_schema_raw.clone(),
            html_template: self.html_template.clone(),
        }
    }
}

/// Input for creating a task template, also its portable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskTemplate {
    pub id: DbId,
    pub name: String,
    pub document_template_id: DbId,
    #[serde(default = "empty_object")]
    pub json_schema: serde_json::Value,
    #[serde(default)]
    pub json_schema_raw: Option<String>,
    #[serde(default)]
    pub html_template: Option<String>,
}
