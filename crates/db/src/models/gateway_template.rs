//! Gateway template models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use procflow_core::types::{DbId, Timestamp};

use super::empty_object;

/// A row from the `gateway_templates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GatewayTemplate {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub gateway_type_id: Option<DbId>,
    pub json_schema: serde_json::Value,
    pub json_schema_raw: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl GatewayTemplate {
    pub fn to_portable(&self) -> CreateGatewayTemplate {
        CreateGatewayTemplate {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            gateway_type_id: self.gateway_type_id,
            json_schema: self.json_schema.clone(),
            json_schema_raw: self.json_schema_raw.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGatewayTemplate {
    pub id: DbId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub gateway_type_id: Option<DbId>,
    #[serde(default = "empty_object")]
    pub json_schema: serde_json::Value,
    #[serde(default)]
    pub json_schema_raw: Option<String>,
}
