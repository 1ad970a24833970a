//! The portable workflow graph document.
//!
//! Export produces it, import consumes it, and version snapshots store it.
//! Only create DTOs appear here, so timestamps never travel with a graph.

use serde::{Deserialize, Serialize};

use super::document_template::CreateDocumentTemplate;
use super::event_template::CreateEventTemplate;
use super::gateway_template::CreateGatewayTemplate;
use super::number_template::CreateNumberTemplate;
use super::task_template::CreateTaskTemplate;
use super::workflow_template::CreateWorkflowTemplate;
use super::workflow_template_category::CreateWorkflowTemplateCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    pub workflow_template: CreateWorkflowTemplate,
    pub workflow_template_category: Option<CreateWorkflowTemplateCategory>,
    pub task_templates: Vec<CreateTaskTemplate>,
    pub document_templates: Vec<CreateDocumentTemplate>,
    pub gateway_templates: Vec<CreateGatewayTemplate>,
    pub event_templates: Vec<CreateEventTemplate>,
    #[serde(default)]
    pub number_templates: Vec<CreateNumberTemplate>,
}
