use serde::{Deserialize, Serialize};

/// All database primary keys are PostgreSQL BIGINT.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Number of decimal digits a dependent template appends to its owner's id.
///
/// Workflow template `123` owns task template `123045`.
pub const DEPENDENT_ID_SUFFIX_DIGITS: u32 = 3;

/// User id recorded on history rows written without an authenticated actor.
pub const SYSTEM_USER_ID: &str = "SYSTEM";

/// The four template kinds reachable from a workflow template's BPMN graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    TaskTemplate,
    DocumentTemplate,
    GatewayTemplate,
    EventTemplate,
}

impl TemplateKind {
    /// Entity name used in errors and log fields.
    pub fn entity_name(self) -> &'static str {
        match self {
            TemplateKind::TaskTemplate => "TaskTemplate",
            TemplateKind::DocumentTemplate => "DocumentTemplate",
            TemplateKind::GatewayTemplate => "GatewayTemplate",
            TemplateKind::EventTemplate => "EventTemplate",
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.entity_name())
    }
}

/// The workflow template that owns a dependent template id.
pub fn owning_workflow_template_id(dependent_id: DbId) -> DbId {
    dependent_id / 10_i64.pow(DEPENDENT_ID_SUFFIX_DIGITS)
}
