//! Number template models.
//!
//! A number template defines how registration numbers are generated for
//! workflows started from a template.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use procflow_core::types::{DbId, Timestamp};

/// A row from the `number_templates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NumberTemplate {
    pub id: DbId,
    pub name: String,
    pub rule_template: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating a number template with a known id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateNumberTemplate {
    pub id: DbId,
    pub name: String,
    #[serde(default)]
    pub rule_template: Option<String>,
}
