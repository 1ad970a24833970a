//! Export and import of whole workflow template graphs.
//!
//! Import writes every row first and validates references to register keys,
//! units and number templates along the way. Problems are collected rather
//! than raised, and any problem rolls the whole import back, so the author
//! sees every issue at once.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use procflow_core::error::{CoreError, ImportIssue};
use procflow_core::expression::is_function_literal;
use procflow_core::schema_scan;
use procflow_core::types::{DbId, TemplateKind};
use procflow_core::versioning::BumpType;
use procflow_db::models::number_template::CreateNumberTemplate;
use procflow_db::models::workflow_graph::WorkflowGraph;
use procflow_db::models::workflow_history::WorkflowHistory;
use procflow_db::repositories::{
    DocumentTemplateRepo, EventTemplateRepo, GatewayTemplateRepo, NumberTemplateRepo,
    TaskTemplateRepo, WorkflowTemplateCategoryRepo, WorkflowTemplateRepo,
};
use procflow_db::DbPool;
use procflow_events::{event_types, EventBus, WorkflowEvent};

use crate::actor::Actor;
use crate::directory::{RegisterKeyDirectory, UnitDirectory};
use crate::error::EngineError;
use crate::graph::GraphResolver;
use crate::versions::{NewVersion, VersionManager};

/// Arrays every import payload must carry.
const REQUIRED_ARRAYS: [&str; 4] = [
    "task_templates",
    "document_templates",
    "gateway_templates",
    "event_templates",
];

/// Options accompanying an import payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportOptions {
    /// Overwrite an existing template or number template with the same id.
    #[serde(default)]
    pub force: bool,
    /// Only `major` is honoured; anything else bumps the minor version.
    #[serde(default)]
    pub bump_type: Option<BumpType>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// History id the client last saw for the target template.
    #[serde(skip)]
    pub last_history_id: Option<DbId>,
}

pub struct TransferService {
    pool: DbPool,
    resolver: GraphResolver,
    versions: Arc<VersionManager>,
    register_keys: Arc<dyn RegisterKeyDirectory>,
    units: Arc<dyn UnitDirectory>,
    event_bus: Arc<EventBus>,
}

impl TransferService {
    pub fn new(
        pool: DbPool,
        resolver: GraphResolver,
        versions: Arc<VersionManager>,
        register_keys: Arc<dyn RegisterKeyDirectory>,
        units: Arc<dyn UnitDirectory>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            pool,
            resolver,
            versions,
            register_keys,
            units,
            event_bus,
        }
    }

    /// The portable graph of a template, `None` when it does not exist.
    ///
    /// The number template named by `data.numberTemplateId` travels with it.
    pub async fn export(&self, id: DbId) -> Result<Option<WorkflowGraph>, EngineError> {
        let graph = match self.resolver.resolve(id).await {
            Ok(graph) => graph,
            Err(EngineError::Core(CoreError::NotFound { .. })) => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut portable = graph.to_portable();
        if let Some(number_template_id) = portable.workflow_template.number_template_id() {
            if let Some(number_template) =
                NumberTemplateRepo::find_by_id(&self.pool, number_template_id).await?
            {
                portable.number_templates.push(
                    CreateNumberTemplate {
                        id: number_template.id,
                        name: number_template.name,
                        rule_template: number_template.rule_template,
                    },
                );
            }
        }
        Ok(Some(portable))
    }

    /// Import a portable graph and commit it as a new version.
    pub async fn import(
        &self,
        payload: serde_json::Value,
        options: ImportOptions,
        actor: &Actor,
    ) -> Result<WorkflowHistory, EngineError> {
        let mut payload = parse_payload(payload)?;
        validate_shape(&payload)?;
        strip_errors_subscribers(&mut payload);

        let mut graph: WorkflowGraph = serde_json::from_value(payload.clone())
            .map_err(|_| CoreError::Validation("Invalid data".to_string()))?;
        graph.workflow_template.errors_subscribers.clear();
        let workflow_template_id = graph.workflow_template.id;

        if WorkflowTemplateRepo::exists(&self.pool, workflow_template_id).await? {
            self.versions
                .ensure_fresh(workflow_template_id, options.last_history_id)
                .await?;
            if !options.force {
                return Err(CoreError::AlreadyCommitted {
                    entity: "WorkflowTemplate",
                    id: workflow_template_id,
                }
                .into());
            }
        }
        if !options.force {
            for number_template in &graph.number_templates {
                if NumberTemplateRepo::exists(&self.pool, number_template.id).await? {
                    return Err(CoreError::AlreadyCommitted {
                        entity: "NumberTemplate",
                        id: number_template.id,
                    }
                    .into());
                }
            }
        }

        let available_keys = if references_register_keys(&graph) {
            self.register_keys.available_key_ids().await?
        } else {
            HashSet::new()
        };

        let mut issues: Vec<ImportIssue> = Vec::new();
        let mut tx = self.pool.begin().await?;

        if let Some(category) = &graph.workflow_template_category {
            WorkflowTemplateCategoryRepo::upsert(&mut *tx, category).await?;
        }
        for number_template in &graph.number_templates {
            NumberTemplateRepo::upsert(&mut *tx, number_template).await?;
        }
        if let Some(number_template_id) = graph.workflow_template.number_template_id() {
            if !NumberTemplateRepo::exists(&mut *tx, number_template_id).await? {
                issues.push(ImportIssue::MissingNumberTemplate { number_template_id });
            }
        }

        WorkflowTemplateRepo::upsert(&mut *tx, &graph.workflow_template).await?;

        for document in &graph.document_templates {
            issues.extend(missing_register_keys(
                &document.json_schema,
                &available_keys,
                TemplateKind::DocumentTemplate,
                document.id,
            ));
            issues.extend(missing_white_list_keys(
                &document.json_schema,
                &available_keys,
                document.id,
            ));
            DocumentTemplateRepo::upsert(&mut *tx, document).await?;
        }

        for task in &graph.task_templates {
            for unit_id in schema_scan::performer_unit_ids(&task.json_schema) {
                if !self.units.unit_exists(unit_id).await? {
                    issues.push(ImportIssue::MissingUnit {
                        unit_id,
                        task_template_id: task.id,
                    });
                }
            }
            TaskTemplateRepo::upsert(&mut *tx, task).await?;
        }

        for gateway in &graph.gateway_templates {
            GatewayTemplateRepo::upsert(&mut *tx, gateway).await?;
        }

        for event in &graph.event_templates {
            issues.extend(missing_register_keys(
                &event.json_schema,
                &available_keys,
                TemplateKind::EventTemplate,
                event.id,
            ));
            EventTemplateRepo::upsert(&mut *tx, event).await?;
        }

        if !issues.is_empty() {
            tx.rollback().await?;
            tracing::warn!(
                workflow_template_id,
                issues = issues.len(),
                "Workflow import rejected"
            );
            return Err(CoreError::WorkflowImport(issues).into());
        }

        let actor = if actor.user_id.trim().is_empty() {
            Actor::system()
        } else {
            actor.clone()
        };
        let bump = BumpType::for_import(options.bump_type);
        let version = VersionManager::next_version(&mut *tx, workflow_template_id, bump).await?;
        let history = VersionManager::commit_version(
            &mut tx,
            workflow_template_id,
            NewVersion {
                version,
                data: payload,
                name: options.name,
                description: options.description,
            },
            &actor,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            workflow_template_id,
            version = history.version.as_deref().unwrap_or_default(),
            tasks = graph.task_templates.len(),
            documents = graph.document_templates.len(),
            "Workflow template imported"
        );
        self.event_bus.publish(
            WorkflowEvent::new(event_types::IMPORTED)
                .with_template(workflow_template_id)
                .with_actor(actor.user_id.clone())
                .with_payload(serde_json::json!({
                    "history_id": history.id,
                    "version": history.version,
                    "force": options.force,
                })),
        );
        Ok(history)
    }
}

/// Accept the payload as a JSON object or as a string holding one.
fn parse_payload(payload: serde_json::Value) -> Result<serde_json::Value, CoreError> {
    match payload {
        serde_json::Value::String(text) => serde_json::from_str(&text)
            .map_err(|_| CoreError::Validation("Invalid data".to_string())),
        other => Ok(other),
    }
}

fn validate_shape(payload: &serde_json::Value) -> Result<(), CoreError> {
    let invalid = || CoreError::Validation("Invalid data".to_string());
    let object = payload.as_object().ok_or_else(invalid)?;

    match object.get("workflow_template") {
        Some(t) if t.is_object() => {}
        _ => return Err(invalid()),
    }
    if !object.contains_key("workflow_template_category") {
        return Err(invalid());
    }
    if REQUIRED_ARRAYS
        .iter()
        .any(|key| !object.get(*key).is_some_and(|v| v.is_array()))
    {
        return Err(invalid());
    }
    Ok(())
}

fn strip_errors_subscribers(payload: &mut serde_json::Value) {
    if let Some(template) = payload
        .get_mut("workflow_template")
        .and_then(|t| t.as_object_mut())
    {
        template.remove("errors_subscribers");
    }
}

fn references_register_keys(graph: &WorkflowGraph) -> bool {
    graph
        .document_templates
        .iter()
        .map(|d| &d.json_schema)
        .chain(graph.event_templates.iter().map(|e| &e.json_schema))
        .any(|schema| {
            !schema_scan::key_ids(schema).is_empty()
                || !schema_scan::white_list_nodes(schema).is_empty()
        })
}

fn missing_register_keys(
    schema: &serde_json::Value,
    available: &HashSet<DbId>,
    template_kind: TemplateKind,
    template_id: DbId,
) -> Vec<ImportIssue> {
    schema_scan::key_ids(schema)
        .into_iter()
        .filter(|key_id| !available.contains(key_id))
        .map(|key_id| ImportIssue::MissingRegisterKey {
            key_id,
            template_kind,
            template_id,
        })
        .collect()
}

/// White-listed keys of nodes whose `keyId` is computed by a function.
fn missing_white_list_keys(
    schema: &serde_json::Value,
    available: &HashSet<DbId>,
    document_template_id: DbId,
) -> Vec<ImportIssue> {
    let mut issues = Vec::new();
    for node in schema_scan::white_list_nodes(schema) {
        let is_function = node.key_id_source().is_some_and(is_function_literal);
        if !is_function {
            continue;
        }
        for key_id in node.key_ids() {
            if !available.contains(&key_id) {
                issues.push(ImportIssue::MissingWhiteListKey {
                    key_id,
                    document_template_id,
                });
            }
        }
    }
    issues
}
