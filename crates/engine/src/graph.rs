//! Resolution of a workflow template's BPMN graph to its dependents.

use procflow_core::bpmn::{normalize_namespace, parse_process_graph};
use procflow_core::error::CoreError;
use procflow_core::types::DbId;
use procflow_db::models::document_template::DocumentTemplate;
use procflow_db::models::event_template::EventTemplate;
use procflow_db::models::gateway_template::GatewayTemplate;
use procflow_db::models::task_template::TaskTemplate;
use procflow_db::models::workflow_graph::WorkflowGraph;
use procflow_db::models::workflow_template::WorkflowTemplate;
use procflow_db::models::workflow_template_category::WorkflowTemplateCategory;
use procflow_db::repositories::{
    DocumentTemplateRepo, EventTemplateRepo, GatewayTemplateRepo, TaskTemplateRepo,
    WorkflowTemplateCategoryRepo, WorkflowTemplateRepo,
};
use procflow_db::DbPool;

use crate::error::EngineError;

/// A workflow template and every template reachable from its process.
#[derive(Debug, Clone)]
pub struct ResolvedGraph {
    pub workflow_template: WorkflowTemplate,
    pub workflow_template_category: Option<WorkflowTemplateCategory>,
    pub task_templates: Vec<TaskTemplate>,
    pub document_templates: Vec<DocumentTemplate>,
    pub gateway_templates: Vec<GatewayTemplate>,
    pub event_templates: Vec<EventTemplate>,
}

impl ResolvedGraph {
    /// Portable form without timestamps or error subscribers.
    pub fn to_portable(&self) -> WorkflowGraph {
        WorkflowGraph {
            workflow_template: self.workflow_template.to_portable(),
            workflow_template_category: self
                .workflow_template_category
                .as_ref()
                .map(WorkflowTemplateCategory::to_portable),
            task_templates: self.task_templates.iter().map(TaskTemplate::to_portable).collect(),
            document_templates: self
                .document_templates
                .iter()
                .map(DocumentTemplate::to_portable)
                .collect(),
            gateway_templates: self
                .gateway_templates
                .iter()
                .map(GatewayTemplate::to_portable)
                .collect(),
            event_templates: self.event_templates.iter().map(EventTemplate::to_portable).collect(),
            number_templates: Vec::new(),
        }
    }

    pub fn task_template_ids(&self) -> Vec<DbId> {
        self.task_templates.iter().map(|t| t.id).collect()
    }

    pub fn document_template_ids(&self) -> Vec<DbId> {
        self.document_templates.iter().map(|t| t.id).collect()
    }

    pub fn gateway_template_ids(&self) -> Vec<DbId> {
        self.gateway_templates.iter().map(|t| t.id).collect()
    }

    pub fn event_template_ids(&self) -> Vec<DbId> {
        self.event_templates.iter().map(|t| t.id).collect()
    }
}

/// Walks the sequence flows of a stored BPMN process.
#[derive(Clone)]
pub struct GraphResolver {
    pool: DbPool,
}

impl GraphResolver {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Resolve the template with `id` and everything its process references.
    ///
    /// References to missing templates are skipped. Fails with `NotFound` when
    /// the template itself is absent and `InvalidXml` when its schema does not
    /// parse to a process.
    pub async fn resolve(&self, id: DbId) -> Result<ResolvedGraph, EngineError> {
        let workflow_template = WorkflowTemplateRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "WorkflowTemplate",
                id,
            })?;
        self.resolve_template(workflow_template).await
    }

    /// Resolve the dependents of an already loaded template.
    pub async fn resolve_template(
        &self,
        workflow_template: WorkflowTemplate,
    ) -> Result<ResolvedGraph, EngineError> {
        let xml = normalize_namespace(&workflow_template.xml_bpmn_schema);
        let process = parse_process_graph(&xml)?;

        let task_templates =
            TaskTemplateRepo::find_by_ids(&self.pool, &process.task_template_ids()).await?;
        let gateway_templates =
            GatewayTemplateRepo::find_by_ids(&self.pool, &process.gateway_template_ids()).await?;
        let event_templates =
            EventTemplateRepo::find_by_ids(&self.pool, &process.event_template_ids()).await?;

        let mut document_ids: Vec<DbId> = Vec::new();
        for task in &task_templates {
            if !document_ids.contains(&task.document_template_id) {
                document_ids.push(task.document_template_id);
            }
        }
        let document_templates = DocumentTemplateRepo::find_by_ids(&self.pool, &document_ids).await?;

        let workflow_template_category = match workflow_template.workflow_template_category_id {
            Some(category_id) => {
                WorkflowTemplateCategoryRepo::find_by_id(&self.pool, category_id).await?
            }
            None => None,
        };

        tracing::debug!(
            workflow_template_id = workflow_template.id,
            tasks = task_templates.len(),
            documents = document_templates.len(),
            gateways = gateway_templates.len(),
            events = event_templates.len(),
            "Resolved workflow template graph"
        );

        Ok(ResolvedGraph {
            workflow_template,
            workflow_template_category,
            task_templates,
            document_templates,
            gateway_templates,
            event_templates,
        })
    }
}
