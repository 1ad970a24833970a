//! Workflow template models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use procflow_core::types::{DbId, Timestamp};

use super::{empty_array, empty_object};

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `workflow_templates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowTemplate {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub xml_bpmn_schema: String,
    pub data: serde_json::Value,
    pub is_active: bool,
    pub workflow_template_category_id: Option<DbId>,
    pub access_units: serde_json::Value,
    pub errors_subscribers: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WorkflowTemplate {
    /// Portable form used in exports, snapshots and copies.
    ///
    /// Error subscribers are environment specific and never leave the row.
    pub fn to_portable(&self) -> CreateWorkflowTemplate {
        CreateWorkflowTemplate {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            xml_bpmn_schema: self.xml_bpmn_schema.clone(),
            data: self.data.clone(),
            is_active: self.is_active,
            workflow_template_category_id: self.workflow_template_category_id,
            access_units: self.access_units.clone(),
            errors_subscribers: Vec::new(),
        }
    }
}

/// Someone notified when a workflow started from the template fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSubscriber {
    pub id: DbId,
    pub email: String,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for creating a workflow template, also its portable form.
///
/// `errors_subscribers` is accepted on input but never serialized, so it
/// cannot leak into exports or history snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateWorkflowTemplate {
    pub id: DbId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub xml_bpmn_schema: String,
    #[serde(default = "empty_object")]
    pub data: serde_json::Value,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub workflow_template_category_id: Option<DbId>,
    #[serde(default = "empty_array")]
    pub access_units: serde_json::Value,
    #[serde(default, skip_serializing)]
    pub errors_subscribers: Vec<ErrorSubscriber>,
}

fn default_active() -> bool {
    true
}

impl CreateWorkflowTemplate {
    /// The number template referenced from `data.numberTemplateId`, if any.
    pub fn number_template_id(&self) -> Option<DbId> {
        self.data.get("numberTemplateId").and_then(|v| {
            v.as_i64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        })
    }
}

// ---------------------------------------------------------------------------
// Update DTO
// ---------------------------------------------------------------------------

/// Full replacement of a workflow template's editable fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWorkflowTemplate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub xml_bpmn_schema: String,
    #[serde(default = "empty_object")]
    pub data: serde_json::Value,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub workflow_template_category_id: Option<DbId>,
    #[serde(default = "empty_array")]
    pub access_units: serde_json::Value,
    #[serde(default)]
    pub errors_subscribers: Vec<ErrorSubscriber>,
}
