//! Document template models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use procflow_core::types::{DbId, Timestamp};

use super::empty_object;

/// A row from the `document_templates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentTemplate {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub json_schema: serde_json::Value,
    pub json_schema_raw: Option<String>,
    pub html_template: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DocumentTemplate {
    pub fn to_portable(&self) -> CreateDocumentTemplate {
        CreateDocumentTemplate {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            json_schema: self.json_schema.clone(),
            json_schema_raw: self.json_schema_raw.clone(),
            html_template: self.html_template.clone(),
        }
    }
}

/// Input for creating a document template, also its portable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDocumentTemplate {
    pub id: DbId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "empty_object")]
    pub json_schema: serde_json::Value,
    #[serde(default)]
    pub json_schema_raw: Option<String>,
    #[serde(default)]
    pub html_template: Option<String>,
}
