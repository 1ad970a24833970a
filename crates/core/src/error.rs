use serde::Serialize;

use crate::types::{DbId, TemplateKind};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid BPMN schema: {0}")]
    InvalidXml(String),

    #[error("{entity} with id {id} already exists")]
    AlreadyCommitted { entity: &'static str, id: DbId },

    #[error("Workflow import failed with {} error(s)", .0.len())]
    WorkflowImport(Vec<ImportIssue>),

    #[error("Some process has already started from workflow template {id}")]
    TemplateInUse { id: DbId },

    #[error("Last-Workflow-History-Id header expired")]
    StaleHistory {
        expected: Option<DbId>,
        received: DbId,
    },

    #[error("Saved workflow template wasn't found, prepare the copy again")]
    StagedCopyNotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// One semantic problem found while importing a workflow graph.
///
/// Import collects every issue before aborting so the author can fix all of
/// them in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImportIssue {
    MissingRegisterKey {
        key_id: DbId,
        template_kind: TemplateKind,
        template_id: DbId,
    },
    MissingWhiteListKey {
        key_id: DbId,
        document_template_id: DbId,
    },
    MissingUnit {
        unit_id: DbId,
        task_template_id: DbId,
    },
    MissingNumberTemplate {
        number_template_id: DbId,
    },
}

impl std::fmt::Display for ImportIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportIssue::MissingRegisterKey {
                key_id,
                template_kind,
                template_id,
            } => write!(
                f,
                "Register key {key_id} doesn't exist but is used in {template_kind} {template_id}."
            ),
            ImportIssue::MissingWhiteListKey {
                key_id,
                document_template_id,
            } => write!(
                f,
                "Register key {key_id} from whiteList doesn't exist but is used in DocumentTemplate {document_template_id}."
            ),
            ImportIssue::MissingUnit {
                unit_id,
                task_template_id,
            } => write!(
                f,
                "Unit {unit_id} doesn't exist but is used as performer unit in TaskTemplate {task_template_id}."
            ),
            ImportIssue::MissingNumberTemplate { number_template_id } => write!(
                f,
                "Number template {number_template_id} doesn't exist but exists in workflow."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_error_counts_issues() {
        let err = CoreError::WorkflowImport(vec![
            ImportIssue::MissingNumberTemplate {
                number_template_id: 5,
            },
            ImportIssue::MissingUnit {
                unit_id: 9,
                task_template_id: 12001,
            },
        ]);
        assert_eq!(err.to_string(), "Workflow import failed with 2 error(s)");
    }

    #[test]
    fn issue_messages_name_the_template() {
        let issue = ImportIssue::MissingRegisterKey {
            key_id: 77,
            template_kind: TemplateKind::EventTemplate,
            template_id: 12003,
        };
        assert_eq!(
            issue.to_string(),
            "Register key 77 doesn't exist but is used in EventTemplate 12003."
        );
    }

    #[test]
    fn issue_serializes_with_type_tag() {
        let issue = ImportIssue::MissingWhiteListKey {
            key_id: 3,
            document_template_id: 12001,
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "missing_white_list_key");
        assert_eq!(json["document_template_id"], 12001);
    }
}
