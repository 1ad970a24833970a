//! Version history of workflow templates.
//!
//! Version-bearing rows come from explicit saves, imports and copies; each
//! becomes the single current row. Auto-save rows carry no version and are
//! never current.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use sqlx::{PgConnection, PgExecutor};
use procflow_core::error::CoreError;
use procflow_core::types::DbId;
use procflow_core::versioning::{self, BumpType, SaveStamp};
use procflow_db::models::workflow_graph::WorkflowGraph;
use procflow_db::models::workflow_history::{
    CreateWorkflowHistory, WorkflowHistory, WorkflowHistorySummary,
};
use procflow_db::repositories::{WorkflowHistoryRepo, WorkflowTemplateRepo};
use procflow_db::DbPool;
use procflow_events::{event_types, EventBus, WorkflowEvent};

use crate::actor::Actor;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::graph::GraphResolver;

/// Body of an explicit save-version request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveVersionRequest {
    #[serde(default)]
    pub bump_type: BumpType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A version-bearing row about to be committed.
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub version: String,
    pub data: serde_json::Value,
    pub name: Option<String>,
    pub description: Option<String>,
}

pub struct VersionManager {
    pool: DbPool,
    resolver: GraphResolver,
    event_bus: Arc<EventBus>,
    auto_save_delay: chrono::Duration,
}

impl VersionManager {
    pub fn new(
        pool: DbPool,
        resolver: GraphResolver,
        event_bus: Arc<EventBus>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            pool,
            resolver,
            event_bus,
            auto_save_delay: config.auto_save_delay(),
        }
    }

    /// The version a commit with `bump` would receive.
    pub async fn next_version<'e, E>(
        executor: E,
        workflow_template_id: DbId,
        bump: BumpType,
    ) -> Result<String, EngineError>
    where
        E: PgExecutor<'e>,
    {
        let last =
            WorkflowHistoryRepo::find_last_version_by_workflow_template_id(executor, workflow_template_id)
                .await?;
        Ok(versioning::next_version(
            last.as_ref().and_then(|h| h.version.as_deref()),
            bump,
        )?)
    }

    /// Make `version` the current row of the template.
    ///
    /// Runs inside the caller's transaction so the flag swap is atomic with the
    /// mutation it records.
    pub async fn commit_version(
        conn: &mut PgConnection,
        workflow_template_id: DbId,
        version: NewVersion,
        actor: &Actor,
    ) -> Result<WorkflowHistory, EngineError> {
        WorkflowHistoryRepo::clear_current_version(&mut *conn, workflow_template_id).await?;

        let input = CreateWorkflowHistory {
            workflow_template_id,
            user_id: actor.user_id.clone(),
            data: version.data,
            version: Some(version.version),
            is_current_version: true,
            meta: actor.meta_json(),
            name: version.name,
            description: version.description,
        };
        Ok(WorkflowHistoryRepo::create(&mut *conn, &input).await?)
    }

    /// Snapshot the resolved graph and commit it as the next version.
    pub async fn save_version(
        &self,
        workflow_template_id: DbId,
        request: SaveVersionRequest,
        actor: &Actor,
    ) -> Result<WorkflowHistory, EngineError> {
        let graph = self.resolver.resolve(workflow_template_id).await?;
        let data = snapshot(&graph.to_portable())?;

        let mut tx = self.pool.begin().await?;
        let version = Self::next_version(&mut *tx, workflow_template_id, request.bump_type).await?;
        let history = Self::commit_version(
            &mut tx,
            workflow_template_id,
            NewVersion {
                version,
                data,
                name: request.name,
                description: request.description,
            },
            actor,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            workflow_template_id,
            version = history.version.as_deref().unwrap_or_default(),
            user_id = %actor.user_id,
            "Workflow template version saved"
        );
        self.event_bus.publish(
            WorkflowEvent::new(event_types::VERSION_SAVED)
                .with_template(workflow_template_id)
                .with_actor(actor.user_id.clone())
                .with_payload(serde_json::json!({
                    "history_id": history.id,
                    "version": history.version,
                })),
        );
        Ok(history)
    }

    /// Record an unversioned snapshot unless debounced.
    ///
    /// Returns `None` when the same user from the same address saved less than
    /// the configured delay ago.
    pub async fn auto_save(
        &self,
        workflow_template_id: DbId,
        actor: &Actor,
    ) -> Result<Option<WorkflowHistory>, EngineError> {
        let workflow_template = WorkflowTemplateRepo::find_by_id(&self.pool, workflow_template_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "WorkflowTemplate",
                id: workflow_template_id,
            })?;

        let last =
            WorkflowHistoryRepo::find_last_by_workflow_template_id(&self.pool, workflow_template_id)
                .await?;
        let current = SaveStamp {
            user_id: actor.user_id.clone(),
            x_forwarded_for: actor.meta.x_forwarded_for.clone(),
            at: Utc::now(),
        };
        let last_stamp = last.as_ref().map(|row| SaveStamp {
            user_id: row.user_id.clone(),
            x_forwarded_for: row
                .meta
                .get("x_forwarded_for")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            at: row.created_at,
        });
        if !versioning::should_auto_save(last_stamp.as_ref(), &current, self.auto_save_delay) {
            return Ok(None);
        }

        // The editor may hold a half-written process; keep the bare template then.
        let graph = match self.resolver.resolve_template(workflow_template.clone()).await {
            Ok(graph) => graph.to_portable(),
            Err(EngineError::Core(CoreError::InvalidXml(reason))) => {
                tracing::warn!(workflow_template_id, %reason, "Auto-saving template with unparseable BPMN");
                WorkflowGraph {
                    workflow_template: workflow_template.to_portable(),
                    workflow_template_category: None,
                    task_templates: Vec::new(),
                    document_templates: Vec::new(),
                    gateway_templates: Vec::new(),
                    event_templates: Vec::new(),
                    number_templates: Vec::new(),
                }
            }
            Err(e) => return Err(e),
        };

        let input = CreateWorkflowHistory {
            workflow_template_id,
            user_id: actor.user_id.clone(),
            data: snapshot(&graph)?,
            version: None,
            is_current_version: false,
            meta: actor.meta_json(),
            name: None,
            description: None,
        };
        let history = WorkflowHistoryRepo::create(&self.pool, &input).await?;

        tracing::debug!(workflow_template_id, history_id = history.id, "Workflow template auto-saved");
        self.event_bus.publish(
            WorkflowEvent::new(event_types::AUTO_SAVED)
                .with_template(workflow_template_id)
                .with_actor(actor.user_id.clone())
                .with_payload(serde_json::json!({ "history_id": history.id })),
        );
        Ok(Some(history))
    }

    /// Reject a mutation whose client saw an older history row.
    ///
    /// `None` skips the check.
    pub async fn ensure_fresh(
        &self,
        workflow_template_id: DbId,
        last_history_id: Option<DbId>,
    ) -> Result<(), EngineError> {
        let Some(received) = last_history_id else {
            return Ok(());
        };
        let expected = WorkflowHistoryRepo::find_last_id(&self.pool, workflow_template_id).await?;
        if expected != Some(received) {
            return Err(CoreError::StaleHistory { expected, received }.into());
        }
        Ok(())
    }

    /// Id of the latest history row, for the response header.
    pub async fn last_history_id(&self, workflow_template_id: DbId) -> Result<Option<DbId>, EngineError> {
        Ok(WorkflowHistoryRepo::find_last_id(&self.pool, workflow_template_id).await?)
    }

    pub async fn list_versions(
        &self,
        workflow_template_id: DbId,
    ) -> Result<Vec<WorkflowHistorySummary>, EngineError> {
        if !WorkflowTemplateRepo::exists(&self.pool, workflow_template_id).await? {
            return Err(CoreError::NotFound {
                entity: "WorkflowTemplate",
                id: workflow_template_id,
            }
            .into());
        }
        Ok(WorkflowHistoryRepo::list_versions(&self.pool, workflow_template_id).await?)
    }

    pub async fn find_version(
        &self,
        workflow_template_id: DbId,
        version: &str,
    ) -> Result<Option<WorkflowHistory>, EngineError> {
        Ok(WorkflowHistoryRepo::find_by_workflow_template_id_and_version(
            &self.pool,
            workflow_template_id,
            version,
        )
        .await?)
    }
}

/// Serialize a portable graph for storage in a history row.
pub(crate) fn snapshot(graph: &WorkflowGraph) -> Result<serde_json::Value, EngineError> {
    serde_json::to_value(graph)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize snapshot: {e}")).into())
}
