//! Event template models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use procflow_core::types::{DbId, Timestamp};

use super::empty_object;

/// A row from the `event_templates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventTemplate {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub event_type_id: Option<DbId>,
    pub json_schema: serde_json::Value,
    pub json_schema_raw: Option<String>,
    pub html_template: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EventTemplate {
    pub fn to_portable(&self) -> CreateEventTemplate {
        CreateEventTemplate {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            event_type_id: self.event_type_id,
            json_schema: self.json_schema.clone(),
            json_schema_raw: self.json_schema_raw.clone(),
            html_template: self.html_template.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateEventTemplate {
    pub id: DbId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_type_id: Option<DbId>,
    #[serde(default = "empty_object")]
    pub json_schema: serde_json::Value,
    #[serde(default)]
    pub json_schema_raw: Option<String>,
    #[serde(default)]
    pub html_template: Option<String>,
}
