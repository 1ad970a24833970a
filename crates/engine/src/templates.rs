//! Workflow template lifecycle: create, full-replace update and delete.

use std::sync::Arc;

use procflow_core::error::CoreError;
use procflow_core::types::DbId;
use procflow_db::models::workflow_history::WorkflowHistory;
use procflow_db::models::workflow_template::{
    CreateWorkflowTemplate, UpdateWorkflowTemplate, WorkflowTemplate,
};
use procflow_db::repositories::{
    DocumentTemplateRepo, EventTemplateRepo, GatewayTemplateRepo, TaskTemplateRepo,
    WorkflowHistoryRepo, WorkflowTemplateRepo,
};
use procflow_db::DbPool;
use procflow_events::{event_types, EventBus, WorkflowEvent};

use crate::actor::Actor;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::graph::GraphResolver;
use crate::versions::VersionManager;

/// PostgreSQL error code for foreign key violations.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgreSQL error code for unique violations.
pub(crate) const UNIQUE_VIOLATION: &str = "23505";

pub struct WorkflowTemplateService {
    pool: DbPool,
    resolver: GraphResolver,
    versions: Arc<VersionManager>,
    event_bus: Arc<EventBus>,
    id_ceiling: DbId,
}

impl WorkflowTemplateService {
    pub fn new(
        pool: DbPool,
        resolver: GraphResolver,
        versions: Arc<VersionManager>,
        event_bus: Arc<EventBus>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            pool,
            resolver,
            versions,
            event_bus,
            id_ceiling: config.workflow_template_id_ceiling,
        }
    }

    pub async fn get(&self, id: DbId) -> Result<WorkflowTemplate, EngineError> {
        WorkflowTemplateRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "WorkflowTemplate",
                    id,
                }
                .into()
            })
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<WorkflowTemplate>, EngineError> {
        Ok(WorkflowTemplateRepo::list(&self.pool, limit, offset).await?)
    }

    /// Create a template under its caller-assigned id.
    pub async fn create(
        &self,
        input: CreateWorkflowTemplate,
        actor: &Actor,
    ) -> Result<WorkflowTemplate, EngineError> {
        check_id_range(input.id, self.id_ceiling)?;
        if WorkflowTemplateRepo::exists(&self.pool, input.id).await? {
            return Err(already_committed(input.id));
        }

        let template = WorkflowTemplateRepo::create(&self.pool, &input)
            .await
            .map_err(|e| {
                if has_error_code(&e, UNIQUE_VIOLATION) {
                    already_committed(input.id)
                } else {
                    e.into()
                }
            })?;

        tracing::info!(workflow_template_id = template.id, user_id = %actor.user_id, "Workflow template created");
        self.event_bus.publish(
            WorkflowEvent::new(event_types::TEMPLATE_CREATED)
                .with_template(template.id)
                .with_actor(actor.user_id.clone()),
        );
        Ok(template)
    }

    /// Replace every editable field, then auto-save a history row.
    pub async fn update(
        &self,
        id: DbId,
        input: UpdateWorkflowTemplate,
        actor: &Actor,
    ) -> Result<(WorkflowTemplate, Option<WorkflowHistory>), EngineError> {
        let template = WorkflowTemplateRepo::update(&self.pool, id, &input)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "WorkflowTemplate",
                id,
            })?;

        self.event_bus.publish(
            WorkflowEvent::new(event_types::TEMPLATE_UPDATED)
                .with_template(id)
                .with_actor(actor.user_id.clone()),
        );

        let history = self.versions.auto_save(id, actor).await?;
        Ok((template, history))
    }

    /// Delete a template with every template reachable from its process.
    ///
    /// A schema that no longer parses leaves no discoverable dependents, so
    /// only the template row is removed. Fails with `TemplateInUse` when a
    /// workflow was started from the template.
    pub async fn delete(&self, id: DbId, actor: &Actor) -> Result<(), EngineError> {
        let (tasks, documents, gateways, events) = match self.resolver.resolve(id).await {
            Ok(graph) => (
                graph.task_template_ids(),
                graph.document_template_ids(),
                graph.gateway_template_ids(),
                graph.event_template_ids(),
            ),
            Err(EngineError::Core(CoreError::InvalidXml(reason))) => {
                tracing::warn!(
                    workflow_template_id = id,
                    %reason,
                    "Deleting workflow template without cascade, BPMN does not parse"
                );
                Default::default()
            }
            Err(e) => return Err(e),
        };

        let mut tx = self.pool.begin().await?;
        EventTemplateRepo::delete_by_ids(&mut *tx, &events).await?;
        GatewayTemplateRepo::delete_by_ids(&mut *tx, &gateways).await?;
        TaskTemplateRepo::delete_by_ids(&mut *tx, &tasks).await?;
        DocumentTemplateRepo::delete_by_ids(&mut *tx, &documents).await?;
        WorkflowHistoryRepo::delete_by_workflow_template_id(&mut *tx, id).await?;
        WorkflowTemplateRepo::delete(&mut *tx, id).await.map_err(|e| {
            if has_error_code(&e, FOREIGN_KEY_VIOLATION) {
                CoreError::TemplateInUse { id }.into()
            } else {
                EngineError::from(e)
            }
        })?;
        tx.commit().await?;

        tracing::info!(
            workflow_template_id = id,
            tasks = tasks.len(),
            documents = documents.len(),
            gateways = gateways.len(),
            events = events.len(),
            "Workflow template deleted"
        );
        self.event_bus.publish(
            WorkflowEvent::new(event_types::TEMPLATE_DELETED)
                .with_template(id)
                .with_actor(actor.user_id.clone()),
        );
        Ok(())
    }
}

fn already_committed(id: DbId) -> EngineError {
    CoreError::AlreadyCommitted {
        entity: "WorkflowTemplate",
        id,
    }
    .into()
}

/// New workflow template ids must be positive and below the ceiling.
pub(crate) fn check_id_range(id: DbId, ceiling: DbId) -> Result<(), CoreError> {
    if id <= 0 || id >= ceiling {
        return Err(CoreError::Validation(format!(
            "Workflow template id {id} must be between 1 and {}",
            ceiling - 1
        )));
    }
    Ok(())
}

pub(crate) fn has_error_code(err: &sqlx::Error, code: &str) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|c| c == code)
}
