//! Two-phase copy of a workflow template graph.
//!
//! `prepare` snapshots the graph into the [`StagedCopyStore`] and reports every
//! id literal in the dependent schemas that might be free text rather than a
//! template reference. `commit` writes the copy under a freshly reserved id,
//! leaving the literals the reviewer excluded untouched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;
use procflow_core::bpmn::rewrite_node_refs;
use procflow_core::error::CoreError;
use procflow_core::id_rewrite::{find_id_matches, remap_prefixed_id, rewrite_json_ids};
use procflow_core::types::{DbId, TemplateKind};
use procflow_core::versioning::INITIAL_VERSION;
use procflow_db::models::document_template::CreateDocumentTemplate;
use procflow_db::models::event_template::CreateEventTemplate;
use procflow_db::models::gateway_template::CreateGatewayTemplate;
use procflow_db::models::task_template::CreateTaskTemplate;
use procflow_db::models::workflow_graph::WorkflowGraph;
use procflow_db::models::workflow_template::CreateWorkflowTemplate;
use procflow_db::models::workflow_template_category::WorkflowTemplateCategory;
use procflow_db::repositories::{
    DocumentTemplateRepo, EventTemplateRepo, GatewayTemplateRepo, TaskTemplateRepo,
    WorkflowTemplateCategoryRepo, WorkflowTemplateRepo,
};
use procflow_db::DbPool;
use procflow_events::{event_types, EventBus, WorkflowEvent};

use crate::actor::Actor;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::graph::GraphResolver;
use crate::staging::StagedCopyStore;
use crate::templates::{check_id_range, has_error_code, UNIQUE_VIOLATION};
use crate::versions::{snapshot, NewVersion, VersionManager};

/// An id literal the reviewer may exclude from rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diff {
    pub id: Uuid,
    pub kind: TemplateKind,
    pub template_id: DbId,
    /// Byte offset of the literal in the compact serialized schema.
    pub index: usize,
    pub before_replacing: String,
    pub after_replacing: String,
}

/// A graph captured by `prepare`, waiting for `commit`.
#[derive(Debug, Clone)]
pub struct StagedCopy {
    pub workflow_template: CreateWorkflowTemplate,
    pub task_templates: Vec<CreateTaskTemplate>,
    pub document_templates: Vec<CreateDocumentTemplate>,
    pub gateway_templates: Vec<CreateGatewayTemplate>,
    pub event_templates: Vec<CreateEventTemplate>,
    pub diffs: Vec<Diff>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CopyPreparation {
    pub request_token: String,
    pub diffs: Vec<Diff>,
    pub diff_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CopyResult {
    pub new_workflow_template_id: DbId,
}

pub struct CopyService {
    pool: DbPool,
    resolver: GraphResolver,
    store: Arc<StagedCopyStore>,
    event_bus: Arc<EventBus>,
    config: EngineConfig,
}

impl CopyService {
    pub fn new(
        pool: DbPool,
        resolver: GraphResolver,
        store: Arc<StagedCopyStore>,
        event_bus: Arc<EventBus>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            pool,
            resolver,
            store,
            event_bus,
            config: config.clone(),
        }
    }

    /// Stage a copy of the template and list the literals needing review.
    pub async fn prepare(&self, id: DbId, actor: &Actor) -> Result<CopyPreparation, EngineError> {
        let graph = self.resolver.resolve(id).await?.to_portable();
        // Preview only; commit reserves its own id.
        let destination_preview = WorkflowTemplateRepo::peek_next_id(&self.pool).await?;

        let mut staged = StagedCopy {
            workflow_template: graph.workflow_template,
            task_templates: graph.task_templates,
            document_templates: graph.document_templates,
            gateway_templates: graph.gateway_templates,
            event_templates: graph.event_templates,
            diffs: Vec::new(),
        };
        staged.workflow_template.errors_subscribers.clear();
        staged.task_templates.iter_mut().for_each(|t| t.json_schema_raw = None);
        staged.document_templates.iter_mut().for_each(|t| t.json_schema_raw = None);
        staged.gateway_templates.iter_mut().for_each(|t| t.json_schema_raw = None);
        staged.event_templates.iter_mut().for_each(|t| t.json_schema_raw = None);

        let mut diffs = Vec::new();
        let schemas = staged
            .task_templates
            .iter()
            .map(|t| (TemplateKind::TaskTemplate, t.id, &t.json_schema))
            .chain(
                staged
                    .document_templates
                    .iter()
                    .map(|t| (TemplateKind::DocumentTemplate, t.id, &t.json_schema)),
            )
            .chain(
                staged
                    .gateway_templates
                    .iter()
                    .map(|t| (TemplateKind::GatewayTemplate, t.id, &t.json_schema)),
            )
            .chain(
                staged
                    .event_templates
                    .iter()
                    .map(|t| (TemplateKind::EventTemplate, t.id, &t.json_schema)),
            );
        for (kind, template_id, schema) in schemas {
            diffs.extend(schema_diffs(kind, template_id, schema, id, destination_preview)?);
        }
        staged.diffs = diffs.clone();

        let request_token = Uuid::new_v4().to_string();
        self.store
            .put(staging_key(id, &request_token), staged, self.config.staged_copy_ttl)
            .await;

        tracing::info!(
            workflow_template_id = id,
            diffs = diffs.len(),
            user_id = %actor.user_id,
            "Workflow template copy prepared"
        );
        self.event_bus.publish(
            WorkflowEvent::new(event_types::COPY_PREPARED)
                .with_template(id)
                .with_actor(actor.user_id.clone())
                .with_payload(serde_json::json!({ "diff_count": diffs.len() })),
        );

        Ok(CopyPreparation {
            request_token,
            diff_count: diffs.len(),
            diffs,
        })
    }

    /// Write the staged copy under a newly reserved template id.
    ///
    /// The staging entry is claimed before any write, so concurrent commits
    /// of one token produce a single copy. On failure the entry goes back
    /// with its original expiry and the commit can be retried.
    pub async fn commit(
        &self,
        id: DbId,
        request_token: &str,
        excluded_diff_ids: &[Uuid],
        actor: &Actor,
    ) -> Result<CopyResult, EngineError> {
        let key = staging_key(id, request_token);
        let claimed = self
            .store
            .take(&key)
            .await
            .ok_or(CoreError::StagedCopyNotFound)?;

        let new_id = match self
            .write_copy(id, &claimed.value, excluded_diff_ids, actor)
            .await
        {
            Ok(new_id) => new_id,
            Err(e) => {
                self.store.restore(key, claimed).await;
                return Err(e);
            }
        };

        tracing::info!(
            workflow_template_id = id,
            new_workflow_template_id = new_id,
            excluded = excluded_diff_ids.len(),
            user_id = %actor.user_id,
            "Workflow template copied"
        );
        self.event_bus.publish(
            WorkflowEvent::new(event_types::COPIED)
                .with_template(new_id)
                .with_actor(actor.user_id.clone())
                .with_payload(serde_json::json!({
                    "source_workflow_template_id": id,
                    "excluded_diffs": excluded_diff_ids.len(),
                })),
        );

        Ok(CopyResult {
            new_workflow_template_id: new_id,
        })
    }

    /// Every write of one copy, in a single transaction.
    async fn write_copy(
        &self,
        id: DbId,
        staged: &StagedCopy,
        excluded_diff_ids: &[Uuid],
        actor: &Actor,
    ) -> Result<DbId, EngineError> {
        let exclusions = Exclusions::resolve(&staged.diffs, excluded_diff_ids)?;

        let mut tx = self.pool.begin().await?;
        let new_id = WorkflowTemplateRepo::reserve_next_id(&mut *tx).await?;
        check_id_range(new_id, self.config.workflow_template_id_ceiling)?;

        let workflow_template =
            clone_workflow_template(&staged.workflow_template, id, new_id, &self.config.copy_name_prefix)?;
        WorkflowTemplateRepo::create(&mut *tx, &workflow_template)
            .await
            .map_err(|e| id_clash(e, "WorkflowTemplate", new_id))?;

        let mut document_templates = Vec::with_capacity(staged.document_templates.len());
        for source in &staged.document_templates {
            let copy = CreateDocumentTemplate {
                id: remap_prefixed_id(source.id, id, new_id)?,
                json_schema: rewrite_json_ids(
                    &source.json_schema,
                    id,
                    new_id,
                    exclusions.get(TemplateKind::DocumentTemplate, source.id),
                )?,
                ..source.clone()
            };
            DocumentTemplateRepo::create(&mut *tx, &copy)
                .await
                .map_err(|e| id_clash(e, "DocumentTemplate", copy.id))?;
            document_templates.push(copy);
        }

        let mut task_templates = Vec::with_capacity(staged.task_templates.len());
        for source in &staged.task_templates {
            let copy = CreateTaskTemplate {
                id: remap_prefixed_id(source.id, id, new_id)?,
                document_template_id: remap_prefixed_id(source.document_template_id, id, new_id)?,
                json_schema: rewrite_json_ids(
                    &source.json_schema,
                    id,
                    new_id,
                    exclusions.get(TemplateKind::TaskTemplate, source.id),
                )?,
                ..source.clone()
            };
            TaskTemplateRepo::create(&mut *tx, &copy)
                .await
                .map_err(|e| id_clash(e, "TaskTemplate", copy.id))?;
            task_templates.push(copy);
        }

        let mut gateway_templates = Vec::with_capacity(staged.gateway_templates.len());
        for source in &staged.gateway_templates {
            let copy = CreateGatewayTemplate {
                id: remap_prefixed_id(source.id, id, new_id)?,
                json_schema: rewrite_json_ids(
                    &source.json_schema,
                    id,
                    new_id,
                    exclusions.get(TemplateKind::GatewayTemplate, source.id),
                )?,
                ..source.clone()
            };
            GatewayTemplateRepo::create(&mut *tx, &copy)
                .await
                .map_err(|e| id_clash(e, "GatewayTemplate", copy.id))?;
            gateway_templates.push(copy);
        }

        let mut event_templates = Vec::with_capacity(staged.event_templates.len());
        for source in &staged.event_templates {
            let copy = CreateEventTemplate {
                id: remap_prefixed_id(source.id, id, new_id)?,
                json_schema: rewrite_json_ids(
                    &source.json_schema,
                    id,
                    new_id,
                    exclusions.get(TemplateKind::EventTemplate, source.id),
                )?,
                ..source.clone()
            };
            EventTemplateRepo::create(&mut *tx, &copy)
                .await
                .map_err(|e| id_clash(e, "EventTemplate", copy.id))?;
            event_templates.push(copy);
        }

        let workflow_template_category = match workflow_template.workflow_template_category_id {
            Some(category_id) => WorkflowTemplateCategoryRepo::find_by_id(&mut *tx, category_id)
                .await?
                .as_ref()
                .map(WorkflowTemplateCategory::to_portable),
            None => None,
        };
        let data = snapshot(&WorkflowGraph {
            workflow_template,
            workflow_template_category,
            task_templates,
            document_templates,
            gateway_templates,
            event_templates,
            number_templates: Vec::new(),
        })?;
        VersionManager::commit_version(
            &mut tx,
            new_id,
            NewVersion {
                version: INITIAL_VERSION.to_string(),
                data,
                name: None,
                description: None,
            },
            actor,
        )
        .await?;
        tx.commit().await?;

        Ok(new_id)
    }
}

fn staging_key(id: DbId, request_token: &str) -> String {
    format!("{id}-{request_token}")
}

/// Non-structural id literals in one dependent schema.
fn schema_diffs(
    kind: TemplateKind,
    template_id: DbId,
    schema: &serde_json::Value,
    source_id: DbId,
    destination_id: DbId,
) -> Result<Vec<Diff>, CoreError> {
    let text = serde_json::to_string(schema)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize schema: {e}")))?;
    Ok(find_id_matches(&text, source_id, destination_id)
        .into_iter()
        .filter(|m| !m.is_safe)
        .map(|m| Diff {
            id: Uuid::new_v4(),
            kind,
            template_id,
            index: m.index,
            before_replacing: m.before_replacing,
            after_replacing: m.after_replacing,
        })
        .collect())
}

fn clone_workflow_template(
    source: &CreateWorkflowTemplate,
    source_id: DbId,
    new_id: DbId,
    name_prefix: &str,
) -> Result<CreateWorkflowTemplate, CoreError> {
    Ok(CreateWorkflowTemplate {
        id: new_id,
        name: format!("{name_prefix}{}", source.name),
        description: source
            .description
            .as_ref()
            .map(|d| format!("{name_prefix}{d}")),
        xml_bpmn_schema: rewrite_node_refs(&source.xml_bpmn_schema, source_id, new_id)?,
        data: rewrite_json_ids(&source.data, source_id, new_id, &HashSet::new())?,
        errors_subscribers: Vec::new(),
        ..source.clone()
    })
}

fn id_clash(err: sqlx::Error, entity: &'static str, id: DbId) -> EngineError {
    if has_error_code(&err, UNIQUE_VIOLATION) {
        CoreError::Conflict(format!("{entity} {id} already exists, copy aborted")).into()
    } else {
        err.into()
    }
}

/// Excluded byte offsets grouped by the template they belong to.
#[derive(Debug, Default)]
struct Exclusions {
    offsets: HashMap<(TemplateKind, DbId), HashSet<usize>>,
    empty: HashSet<usize>,
}

impl Exclusions {
    fn resolve(diffs: &[Diff], excluded_ids: &[Uuid]) -> Result<Self, CoreError> {
        let by_id: HashMap<Uuid, &Diff> = diffs.iter().map(|d| (d.id, d)).collect();
        let mut exclusions = Self::default();
        for excluded in excluded_ids {
            let diff = by_id
                .get(excluded)
                .ok_or_else(|| CoreError::Validation(format!("Unknown diff id {excluded}")))?;
            exclusions
                .offsets
                .entry((diff.kind, diff.template_id))
                .or_default()
                .insert(diff.index);
        }
        Ok(exclusions)
    }

    fn get(&self, kind: TemplateKind, template_id: DbId) -> &HashSet<usize> {
        self.offsets.get(&(kind, template_id)).unwrap_or(&self.empty)
    }
}
